//! Request DTOs for the admin API
//!
//! Defines the structure of incoming HTTP request bodies and query strings.

use serde::Deserialize;
use serde_json::Value;

use crate::cache::CacheGroup;

/// Request body for PUT /entries
///
/// # Fields
/// - `key`: The cache key, normally built with `build_cache_key`
/// - `value`: Any JSON payload
/// - `group`: Group the entry is invalidated with
/// - `ttl_ms`: Optional TTL; defaults to the configured TTL of the key
#[derive(Debug, Clone, Deserialize)]
pub struct SetRequest {
    /// The cache key
    pub key: String,
    /// The payload to store
    pub value: Value,
    /// Owning group
    pub group: CacheGroup,
    /// Optional TTL in milliseconds
    #[serde(default)]
    pub ttl_ms: Option<u64>,
}

impl SetRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.key.is_empty() {
            return Some("Key cannot be empty".to_string());
        }
        if self.ttl_ms == Some(0) {
            return Some("TTL must be positive".to_string());
        }
        None
    }
}

/// Query string for DELETE /entities/:group/:id
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntityInvalidationQuery {
    /// Cascade depth; the cache's configured depth when absent
    #[serde(default)]
    pub depth: Option<u32>,
    /// Set to false to invalidate only the entity's own entries
    #[serde(default)]
    pub cascade: Option<bool>,
}
