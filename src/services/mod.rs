//! Services Module
//!
//! Data-access helpers built on the shared cache.

mod cached_query;

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::cache::CacheStore;

pub use cached_query::CachedQuery;

/// Cache instance shared by every service, created once at startup.
pub type SharedCache = Arc<RwLock<CacheStore>>;
