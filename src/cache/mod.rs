//! Cache Module
//!
//! In-memory entity cache with per-group TTL policies, lazy expiration and
//! cascading invalidation across dependent groups.

mod config;
mod entry;
mod group;
mod key;
mod relations;
mod stats;
mod store;


// Re-export public types
pub use config::{get_cache_duration, group_default_duration};
pub use entry::{estimate_size, CacheEntry, BYTES_PER_CHAR};
pub use group::{CacheDuration, CacheGroup};
pub use key::{build_cache_key, CacheKey, EntityId};
pub use relations::RelationGraph;
pub use stats::{CacheStats, CacheStatsSnapshot};
pub use store::{CacheStore, CascadeOutcome, DEFAULT_CASCADE_DEPTH, DEFAULT_TTL};
