//! Cache Entry Module
//!
//! Defines a single cached payload with its group, TTL and key metadata.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde_json::Value;

use crate::cache::{CacheGroup, CacheKey};

/// Bytes assumed per serialized character when estimating memory use.
pub const BYTES_PER_CHAR: u64 = 2;

// == Cache Entry ==
/// Represents a single cache entry with payload and metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The cached payload, opaque to the engine
    pub data: Value,
    /// Last write timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Time to live in milliseconds, fixed at write time
    pub expires_in: u64,
    /// Group used for bulk and cascade invalidation
    pub group: CacheGroup,
    /// Estimated footprint of `data`, captured at write time
    pub size_bytes: u64,
    /// Entity id parsed from the key, if it has one
    pub entity_id: Option<String>,
    /// User id parsed from the key, if it has one
    pub user_id: Option<u64>,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new entry for `key`, stamped with the current time.
    ///
    /// # Arguments
    /// * `key` - The key the entry is stored under
    /// * `data` - The payload
    /// * `group` - Owning group
    /// * `ttl` - Time to live
    pub fn new(key: &str, data: Value, group: CacheGroup, ttl: Duration) -> Self {
        let parsed = CacheKey::parse(key);
        let size_bytes = estimate_size(&data);

        Self {
            data,
            created_at: current_timestamp_ms(),
            expires_in: u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX),
            group,
            size_bytes,
            entity_id: parsed
                .as_ref()
                .and_then(|key| key.entity_id().map(ToString::to_string)),
            user_id: parsed.and_then(|key| key.user_id()),
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is live while `now - created_at <= expires_in`, so it is
    /// still served at exactly its TTL and expires one millisecond later.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(current_timestamp_ms())
    }

    /// Expiry check against an explicit clock reading.
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.created_at) > self.expires_in
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds, `0` once expired.
    pub fn ttl_remaining_ms(&self) -> u64 {
        let age = current_timestamp_ms().saturating_sub(self.created_at);
        self.expires_in.saturating_sub(age)
    }

    /// True when the key carried `entity_id` as its entity segment.
    pub fn belongs_to_entity(&self, entity_id: &str) -> bool {
        self.entity_id.as_deref() == Some(entity_id)
    }
}

// == Utility Functions ==
/// Approximate in-memory size of a payload.
///
/// Serialized JSON length times [`BYTES_PER_CHAR`]; an estimate, not an
/// exact accounting of heap usage.
pub fn estimate_size(data: &Value) -> u64 {
    data.to_string().len() as u64 * BYTES_PER_CHAR
}

/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}
