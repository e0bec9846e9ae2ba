//! Read-through cache layer over a `CacheStore`.

use chrono::{DateTime, Duration, Utc};
use color_eyre::Result;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

use super::store::CacheStore;

/// A cached payload with the time it was fetched.
#[derive(Debug, Serialize, Deserialize)]
pub struct CacheEntry<T> {
  pub data: T,
  pub cached_at: DateTime<Utc>,
}

/// Where a fetched payload came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
  /// Fresh data from the backend
  Network,
  /// Served from the local cache without a network call
  Cache,
}

/// Result of a cached fetch.
#[derive(Debug, Clone)]
pub struct CacheResult<T> {
  pub data: T,
  pub source: CacheSource,
  /// When the data was cached (only for cache hits)
  pub cached_at: Option<DateTime<Utc>>,
}

/// How long a cached entry may be served before it counts as stale.
pub const CACHE_TTL_SECS: i64 = 300;

/// Cache layer with a fixed TTL.
///
/// Stale entries are treated exactly like misses: they are never served, not
/// even as a fallback when the network fetch fails. A failed refresh
/// propagates its error and the caller decides what to keep showing.
pub struct CacheLayer {
  store: Arc<dyn CacheStore>,
  ttl: Duration,
}

impl CacheLayer {
  pub fn new(store: Arc<dyn CacheStore>) -> Self {
    Self {
      store,
      ttl: Duration::seconds(CACHE_TTL_SECS),
    }
  }

  /// Override the TTL. Test hook.
  #[cfg(test)]
  pub fn with_ttl(mut self, ttl: Duration) -> Self {
    self.ttl = ttl;
    self
  }

  fn is_stale(&self, cached_at: DateTime<Utc>) -> bool {
    Utc::now() - cached_at >= self.ttl
  }

  /// Fetch a payload, serving a fresh cache entry when allowed.
  ///
  /// With `force` set the cache is not consulted at all; the fetcher runs and
  /// its result is written through. Otherwise a non-stale entry is adopted
  /// without calling the fetcher.
  pub async fn fetch<T, F, Fut>(&self, key: &str, force: bool, fetcher: F) -> Result<CacheResult<T>>
  where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
  {
    if !force {
      if let Some(entry) = self.read_entry::<T>(key) {
        if !self.is_stale(entry.cached_at) {
          return Ok(CacheResult {
            data: entry.data,
            source: CacheSource::Cache,
            cached_at: Some(entry.cached_at),
          });
        }
      }
    }

    let data = fetcher().await?;
    self.write_entry(key, &data);

    Ok(CacheResult {
      data,
      source: CacheSource::Network,
      cached_at: None,
    })
  }

  /// Parse a stored entry, treating anything unreadable as a miss.
  fn read_entry<T: DeserializeOwned>(&self, key: &str) -> Option<CacheEntry<T>> {
    let raw = self.store.read(key)?;
    match serde_json::from_str(&raw) {
      Ok(entry) => Some(entry),
      Err(e) => {
        debug!("discarding unparseable cache entry for {}: {}", key, e);
        None
      }
    }
  }

  fn write_entry<T: Serialize>(&self, key: &str, data: &T) {
    let entry = CacheEntry {
      data,
      cached_at: Utc::now(),
    };
    match serde_json::to_string(&entry) {
      Ok(raw) => self.store.write(key, &raw),
      Err(e) => debug!("cache serialization for {} failed: {}", key, e),
    }
  }
}

impl Clone for CacheLayer {
  fn clone(&self) -> Self {
    Self {
      store: Arc::clone(&self.store),
      ttl: self.ttl,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashMap;
  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::sync::Mutex;

  /// In-memory store for exercising the layer.
  #[derive(Default)]
  struct MemoryStore {
    map: Mutex<HashMap<String, String>>,
  }

  impl CacheStore for MemoryStore {
    fn read(&self, key: &str) -> Option<String> {
      self.map.lock().unwrap().get(key).cloned()
    }

    fn write(&self, key: &str, value: &str) {
      self
        .map
        .lock()
        .unwrap()
        .insert(key.to_string(), value.to_string());
    }
  }

  fn counting_fetcher(
    calls: &Arc<AtomicUsize>,
    value: u32,
  ) -> impl FnOnce() -> std::future::Ready<Result<u32>> {
    let calls = calls.clone();
    move || {
      calls.fetch_add(1, Ordering::SeqCst);
      std::future::ready(Ok(value))
    }
  }

  #[tokio::test]
  async fn test_fresh_entry_skips_network() {
    let layer = CacheLayer::new(Arc::new(MemoryStore::default()));
    let calls = Arc::new(AtomicUsize::new(0));

    let first = layer
      .fetch("k", false, counting_fetcher(&calls, 1))
      .await
      .unwrap();
    assert_eq!(first.source, CacheSource::Network);

    let second = layer
      .fetch("k", false, counting_fetcher(&calls, 2))
      .await
      .unwrap();
    assert_eq!(second.source, CacheSource::Cache);
    assert_eq!(second.data, 1);
    assert!(second.cached_at.is_some());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_expired_entry_refetches() {
    let layer = CacheLayer::new(Arc::new(MemoryStore::default())).with_ttl(Duration::zero());
    let calls = Arc::new(AtomicUsize::new(0));

    layer
      .fetch("k", false, counting_fetcher(&calls, 1))
      .await
      .unwrap();
    let second = layer
      .fetch("k", false, counting_fetcher(&calls, 2))
      .await
      .unwrap();

    assert_eq!(second.source, CacheSource::Network);
    assert_eq!(second.data, 2);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn test_force_bypasses_fresh_cache() {
    let layer = CacheLayer::new(Arc::new(MemoryStore::default()));
    let calls = Arc::new(AtomicUsize::new(0));

    layer
      .fetch("k", false, counting_fetcher(&calls, 1))
      .await
      .unwrap();
    let forced = layer
      .fetch("k", true, counting_fetcher(&calls, 2))
      .await
      .unwrap();

    assert_eq!(forced.source, CacheSource::Network);
    assert_eq!(forced.data, 2);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn test_corrupt_entry_is_a_miss() {
    let store = Arc::new(MemoryStore::default());
    store.write("k", "not json at all");
    let layer = CacheLayer::new(store);
    let calls = Arc::new(AtomicUsize::new(0));

    let result = layer
      .fetch("k", false, counting_fetcher(&calls, 9))
      .await
      .unwrap();
    assert_eq!(result.source, CacheSource::Network);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_write_through_after_fetch() {
    let store = Arc::new(MemoryStore::default());
    let layer = CacheLayer::new(Arc::clone(&store) as Arc<dyn CacheStore>);
    let calls = Arc::new(AtomicUsize::new(0));

    layer
      .fetch("k", false, counting_fetcher(&calls, 7))
      .await
      .unwrap();

    let raw = store.read("k").expect("entry written through");
    let entry: CacheEntry<u32> = serde_json::from_str(&raw).unwrap();
    assert_eq!(entry.data, 7);
  }

  #[tokio::test]
  async fn test_fetch_error_propagates() {
    let layer = CacheLayer::new(Arc::new(MemoryStore::default()));

    let result: Result<CacheResult<u32>> = layer
      .fetch("k", false, || {
        std::future::ready(Err(color_eyre::eyre::eyre!("backend down")))
      })
      .await;

    assert!(result.is_err());
  }
}
