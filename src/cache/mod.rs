//! Local caching for fetched sprint-data payloads.
//!
//! A payload is cached per project under a fixed key scheme with a 5-minute
//! TTL. Caching is a best-effort optimization: storage and parse failures are
//! swallowed and reported as misses, never surfaced to the user.

mod layer;
mod store;

pub use layer::{CacheLayer, CacheResult, CacheSource, CACHE_TTL_SECS};
pub use store::{sprint_cache_key, CacheStore, NoopStore, SqliteStore};
