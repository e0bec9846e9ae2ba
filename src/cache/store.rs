//! Key-value stores backing the sprint-data cache.
//!
//! Every operation here is best-effort: a read that fails for any reason
//! (missing table, corrupt row, unparseable JSON) reports a miss, and a write
//! that fails is dropped. Cache trouble must never block data loading.

use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection};
use std::sync::Mutex;
use tracing::debug;

/// Prefix for per-project cache keys.
pub const CACHE_KEY_PREFIX: &str = "zenhub_sprint_cache_";

/// Cache key for a project's sprint-data payload.
pub fn sprint_cache_key(project: &str) -> String {
  format!("{}{}", CACHE_KEY_PREFIX, project)
}

/// Trait for cache storage backends.
///
/// Values are opaque strings (serialized `CacheEntry` JSON); the layer above
/// owns the serialization so backends stay object-safe.
pub trait CacheStore: Send + Sync {
  /// Returns the stored value, or None on miss or any storage error.
  fn read(&self, key: &str) -> Option<String>;

  /// Stores a value, silently dropping it on any storage error.
  fn write(&self, key: &str, value: &str);
}

/// Storage that caches nothing. Used when caching is disabled, or when the
/// sqlite store could not be opened.
pub struct NoopStore;

impl CacheStore for NoopStore {
  fn read(&self, _key: &str) -> Option<String> {
    None
  }

  fn write(&self, _key: &str, _value: &str) {}
}

const STORE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS sprint_cache (
    cache_key TEXT PRIMARY KEY,
    entry TEXT NOT NULL
);
"#;

/// SQLite-backed key-value store in the user data directory.
pub struct SqliteStore {
  conn: Mutex<Connection>,
}

impl SqliteStore {
  /// Open (or create) the store at the default location.
  pub fn open() -> Result<Self> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;
    let path = data_dir.join("z9s").join("cache.db");

    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create cache directory: {}", e))?;
    }

    let conn = Connection::open(&path)
      .map_err(|e| eyre!("Failed to open cache database at {}: {}", path.display(), e))?;

    Self::from_connection(conn)
  }

  fn from_connection(conn: Connection) -> Result<Self> {
    conn
      .execute_batch(STORE_SCHEMA)
      .map_err(|e| eyre!("Failed to create cache table: {}", e))?;

    Ok(Self {
      conn: Mutex::new(conn),
    })
  }

  #[cfg(test)]
  pub fn in_memory() -> Self {
    Self::from_connection(Connection::open_in_memory().unwrap()).unwrap()
  }
}

impl CacheStore for SqliteStore {
  fn read(&self, key: &str) -> Option<String> {
    let conn = match self.conn.lock() {
      Ok(conn) => conn,
      Err(_) => return None,
    };

    conn
      .query_row(
        "SELECT entry FROM sprint_cache WHERE cache_key = ?",
        params![key],
        |row| row.get(0),
      )
      .ok()
  }

  fn write(&self, key: &str, value: &str) {
    let conn = match self.conn.lock() {
      Ok(conn) => conn,
      Err(_) => return,
    };

    if let Err(e) = conn.execute(
      "INSERT OR REPLACE INTO sprint_cache (cache_key, entry) VALUES (?, ?)",
      params![key, value],
    ) {
      debug!("cache write for {} dropped: {}", key, e);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_cache_key_scheme() {
    assert_eq!(sprint_cache_key("PROJ-1"), "zenhub_sprint_cache_PROJ-1");
  }

  #[test]
  fn test_sqlite_round_trip() {
    let store = SqliteStore::in_memory();
    assert_eq!(store.read("zenhub_sprint_cache_p1"), None);

    store.write("zenhub_sprint_cache_p1", r#"{"data":1}"#);
    assert_eq!(
      store.read("zenhub_sprint_cache_p1").as_deref(),
      Some(r#"{"data":1}"#)
    );
  }

  #[test]
  fn test_sqlite_overwrite() {
    let store = SqliteStore::in_memory();
    store.write("k", "old");
    store.write("k", "new");
    assert_eq!(store.read("k").as_deref(), Some("new"));
  }

  #[test]
  fn test_noop_store_never_hits() {
    let store = NoopStore;
    store.write("k", "v");
    assert_eq!(store.read("k"), None);
  }
}
