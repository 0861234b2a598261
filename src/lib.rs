//! Nutri Cache - In-memory entity cache for the nutrition data layer
//!
//! Provides TTL-bound storage for query results, grouped by domain entity,
//! with prefix, group, entity and cascading invalidation plus performance
//! statistics.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use error::{CacheError, Result};
pub use services::{CachedQuery, SharedCache};
pub use tasks::spawn_stats_reporter;
