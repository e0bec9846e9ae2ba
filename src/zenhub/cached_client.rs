//! Sprint-data client with transparent read-through caching.

use color_eyre::Result;
use std::sync::Arc;
use tracing::warn;

use crate::cache::{sprint_cache_key, CacheLayer, CacheResult, CacheStore, NoopStore, SqliteStore};
use crate::config::Config;

use super::client::ZenhubClient;
use super::types::SprintData;

/// Wraps `ZenhubClient` with per-project payload caching.
///
/// Payloads are normalized before they are cached, so both the cache and the
/// rest of the application only ever see the canonical shape.
#[derive(Clone)]
pub struct CachedZenhubClient {
  inner: ZenhubClient,
  cache: CacheLayer,
}

impl CachedZenhubClient {
  pub fn new(config: &Config) -> Result<Self> {
    let inner = ZenhubClient::new(config)?;

    // Cache trouble must never block data loading: if the store can't be
    // opened we degrade to uncached operation instead of failing.
    let store: Arc<dyn CacheStore> = if config.cache.enabled {
      match SqliteStore::open() {
        Ok(store) => Arc::new(store),
        Err(e) => {
          warn!("sprint cache unavailable, running uncached: {}", e);
          Arc::new(NoopStore)
        }
      }
    } else {
      Arc::new(NoopStore)
    };

    Ok(Self {
      inner,
      cache: CacheLayer::new(store),
    })
  }

  /// Load sprint data for a project.
  ///
  /// Without `force_refresh` a fresh cache entry is adopted without touching
  /// the network. Forcing always hits the backend (with its refresh flag set)
  /// and overwrites the cache entry.
  pub async fn get_sprint_data(
    &self,
    project: &str,
    force_refresh: bool,
  ) -> Result<CacheResult<SprintData>> {
    let key = sprint_cache_key(project);

    self
      .cache
      .fetch(&key, force_refresh, || {
        let inner = self.inner.clone();
        let project = project.to_string();
        async move {
          let raw = inner.get_sprint_data(&project, force_refresh).await?;
          Ok(raw.normalize())
        }
      })
      .await
  }
}
