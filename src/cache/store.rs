//! Cache Store Module
//!
//! Main cache engine: key-value storage with lazy TTL expiration, group
//! tagging, and prefix, group, entity and cascading invalidation.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::cache::{
    CacheDuration, CacheEntry, CacheGroup, CacheStats, CacheStatsSnapshot, EntityId,
    RelationGraph,
};
use crate::error::Result;

/// TTL used when the caller has no better policy.
pub const DEFAULT_TTL: CacheDuration = CacheDuration::Medium;

/// How many relation hops a cascade follows by default.
pub const DEFAULT_CASCADE_DEPTH: u32 = 2;

// == Cascade Outcome ==
/// What a cascading invalidation touched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CascadeOutcome {
    /// Entries removed across all groups
    pub removed: usize,
    /// Group traversals performed, including the origin group
    pub groups_visited: usize,
}

// == Cache Store ==
/// In-memory cache with per-entry TTL and group-aware invalidation.
///
/// Expiration is lazy: a stale entry stays in memory until a lookup or an
/// invalidation scan touches it.
#[derive(Debug)]
pub struct CacheStore {
    /// Key-value storage
    entries: HashMap<String, CacheEntry>,
    /// Which groups depend on which
    relations: RelationGraph,
    /// Performance statistics
    stats: CacheStats,
    /// Depth used by `invalidate_entity_cascade`
    cascade_depth: u32,
}

impl CacheStore {
    // == Constructor ==
    /// Creates an empty store.
    ///
    /// # Arguments
    /// * `relations` - Dependency graph followed by cascades
    /// * `cascade_depth` - Default number of hops a cascade follows
    pub fn new(relations: RelationGraph, cascade_depth: u32) -> Self {
        Self {
            entries: HashMap::new(),
            relations,
            stats: CacheStats::new(),
            cascade_depth,
        }
    }

    // == Get ==
    /// Returns the payload stored at `key` if it is live.
    ///
    /// Counts a hit or a miss. An expired entry is removed and counted as
    /// a miss.
    pub fn get(&mut self, key: &str) -> Option<Value> {
        let started = Instant::now();

        match self.entries.get(key) {
            Some(entry) if !entry.is_expired() => {
                let data = entry.data.clone();
                let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
                self.stats.record_hit(elapsed_ms);
                debug!("Cache hit: {} ({:.3}ms)", key, elapsed_ms);
                Some(data)
            }
            Some(_) => {
                self.evict_expired(key);
                self.stats.record_miss();
                debug!("Cache miss (expired): {}", key);
                None
            }
            None => {
                self.stats.record_miss();
                debug!("Cache miss: {}", key);
                None
            }
        }
    }

    /// Typed [`get`](Self::get).
    ///
    /// A payload that does not decode as `T` is an error, not a miss.
    pub fn get_as<T: DeserializeOwned>(&mut self, key: &str) -> Result<Option<T>> {
        Ok(self
            .get(key)
            .map(serde_json::from_value)
            .transpose()?)
    }

    // == Set ==
    /// Stores `data` at `key`, replacing any previous entry.
    ///
    /// # Arguments
    /// * `key` - The key to store
    /// * `data` - The payload
    /// * `group` - Group the entry is invalidated with
    /// * `ttl` - Time to live, usually from `get_cache_duration`
    pub fn set(
        &mut self,
        key: impl Into<String>,
        data: Value,
        group: CacheGroup,
        ttl: impl Into<Duration>,
    ) {
        let key = key.into();
        let entry = CacheEntry::new(&key, data, group, ttl.into());
        let (size_bytes, expires_in) = (entry.size_bytes, entry.expires_in);

        match self.entries.insert(key.clone(), entry) {
            Some(previous) => {
                self.stats.entry_replaced(previous.size_bytes, size_bytes);
                debug!("Cache updated: {}", key);
            }
            None => {
                self.stats.entry_added(size_bytes);
                debug!(
                    "Cache set: {} (group: {}, expires in: {}s, size: {:.2}KB)",
                    key,
                    group,
                    expires_in / 1000,
                    size_bytes as f64 / 1024.0
                );
            }
        }
    }

    /// Typed [`set`](Self::set).
    pub fn set_as<T: Serialize>(
        &mut self,
        key: impl Into<String>,
        data: &T,
        group: CacheGroup,
        ttl: impl Into<Duration>,
    ) -> Result<()> {
        let value = serde_json::to_value(data)?;
        self.set(key, value, group, ttl);
        Ok(())
    }

    // == Has ==
    /// True if `key` holds a live entry. Does not count as a hit or miss.
    pub fn has(&mut self, key: &str) -> bool {
        match self.entries.get(key) {
            Some(entry) if !entry.is_expired() => true,
            Some(_) => {
                self.evict_expired(key);
                false
            }
            None => false,
        }
    }

    /// True if `key` is physically stored, live or not. Never evicts.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    // == Delete ==
    /// Removes `key`. Returns false, changing nothing, if it was absent.
    pub fn delete(&mut self, key: &str) -> bool {
        match self.entries.remove(key) {
            Some(entry) => {
                self.stats.entries_invalidated(1, entry.size_bytes);
                debug!("Cache delete: {}", key);
                true
            }
            None => false,
        }
    }

    // == Clear ==
    /// Removes every entry. Returns how many were removed.
    pub fn clear(&mut self) -> usize {
        let removed = self.entries.len();
        self.entries.clear();
        self.stats.entries_cleared(removed);
        info!("Cache cleared: {} entries removed", removed);
        removed
    }

    // == Invalidate By Prefix ==
    /// Removes every key starting with `prefix`.
    ///
    /// An empty prefix would match everything and is ignored; use
    /// [`clear`](Self::clear) for that.
    pub fn invalidate_by_prefix(&mut self, prefix: &str) -> usize {
        if prefix.is_empty() {
            return 0;
        }

        let removed = self.remove_where(|key, _| key.starts_with(prefix));
        if removed > 0 {
            info!(
                "Cache invalidation by prefix: {} - {} entries removed",
                prefix, removed
            );
        }
        removed
    }

    // == Invalidate By Group ==
    /// Removes every entry tagged with `group`, whatever its key.
    pub fn invalidate_by_group(&mut self, group: CacheGroup) -> usize {
        let removed = self.remove_where(|_, entry| entry.group == group);
        if removed > 0 {
            info!(
                "Cache invalidation by group: {} - {} entries removed",
                group, removed
            );
        }
        removed
    }

    // == Invalidate Entity ==
    /// Removes the entries of `group` whose key names `entity_id` as its
    /// entity segment. List caches of the group are left alone.
    pub fn invalidate_entity(&mut self, group: CacheGroup, entity_id: impl Into<EntityId>) -> usize {
        let entity_id = entity_id.into().to_string();
        let removed = self.remove_where(|_, entry| {
            entry.group == group && entry.belongs_to_entity(&entity_id)
        });
        if removed > 0 {
            info!(
                "Cache invalidation for entity: {}/{} - {} entries removed",
                group, entity_id, removed
            );
        }
        removed
    }

    // == Cascading Invalidation ==
    /// [`invalidate_entity_cascade_with_depth`](Self::invalidate_entity_cascade_with_depth)
    /// using the store's configured depth.
    pub fn invalidate_entity_cascade(
        &mut self,
        group: CacheGroup,
        entity_id: impl Into<EntityId>,
    ) -> CascadeOutcome {
        self.invalidate_entity_cascade_with_depth(group, entity_id, self.cascade_depth)
    }

    /// Invalidates an entity, its group's list caches, and every group
    /// reachable through the relation graph within `depth` hops.
    ///
    /// Each dependent group is invalidated whole, lists included. Depth is
    /// the only bound, so a cyclic graph revisits groups but still stops.
    pub fn invalidate_entity_cascade_with_depth(
        &mut self,
        group: CacheGroup,
        entity_id: impl Into<EntityId>,
        depth: u32,
    ) -> CascadeOutcome {
        let entity_id = entity_id.into();
        let mut outcome = CascadeOutcome {
            removed: self.invalidate_entity(group, entity_id.clone()),
            groups_visited: 1,
        };
        outcome.removed += self.invalidate_lists(group);

        if depth > 0 {
            for dependent in self.relations.dependents(group).to_vec() {
                self.invalidate_group_with_lists(dependent, depth - 1, &mut outcome);
            }
        }

        info!(
            "Cascade invalidation completed for {}/{}: {} entries removed across {} groups",
            group, entity_id, outcome.removed, outcome.groups_visited
        );
        outcome
    }

    fn invalidate_group_with_lists(
        &mut self,
        group: CacheGroup,
        depth: u32,
        outcome: &mut CascadeOutcome,
    ) {
        outcome.groups_visited += 1;
        outcome.removed += self.invalidate_by_group(group);
        outcome.removed += self.invalidate_lists(group);

        if depth > 0 {
            for dependent in self.relations.dependents(group).to_vec() {
                self.invalidate_group_with_lists(dependent, depth - 1, outcome);
            }
        }
    }

    /// Removes list queries of `group` (keys under `{group}:list`).
    fn invalidate_lists(&mut self, group: CacheGroup) -> usize {
        self.invalidate_by_prefix(&format!("{}:list", group))
    }

    // == Statistics ==
    /// Records the latency of a data-source fetch made after a miss.
    pub fn record_access_time_without_cache(&mut self, elapsed: Duration) {
        self.stats
            .record_access_time_without_cache(elapsed.as_secs_f64() * 1000.0);
    }

    /// Returns a snapshot of the current statistics.
    pub fn stats(&self) -> CacheStatsSnapshot {
        self.stats.snapshot()
    }

    /// Zeroes activity counters. Entry count and size are kept.
    pub fn reset_stats(&mut self) {
        self.stats.reset_activity();
        info!("Cache statistics reset");
    }

    // == Accessors ==
    /// Returns the current number of entries, live or expired.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Relation hops followed by [`invalidate_entity_cascade`](Self::invalidate_entity_cascade).
    pub fn cascade_depth(&self) -> u32 {
        self.cascade_depth
    }

    // == Internal Removal ==
    fn evict_expired(&mut self, key: &str) {
        if let Some(entry) = self.entries.remove(key) {
            self.stats.entries_expired(1, entry.size_bytes);
        }
    }

    /// Removes entries matching `predicate` as invalidations, sweeping any
    /// other expired entries met during the scan. Returns the number of
    /// matching entries removed.
    fn remove_where<F>(&mut self, predicate: F) -> usize
    where
        F: Fn(&str, &CacheEntry) -> bool,
    {
        let mut matched = Vec::new();
        let mut expired = Vec::new();
        for (key, entry) in &self.entries {
            if predicate(key, entry) {
                matched.push(key.clone());
            } else if entry.is_expired() {
                expired.push(key.clone());
            }
        }

        let matched_bytes = self.remove_keys(&matched);
        let expired_bytes = self.remove_keys(&expired);

        if !matched.is_empty() {
            self.stats.entries_invalidated(matched.len(), matched_bytes);
        }
        if !expired.is_empty() {
            self.stats.entries_expired(expired.len(), expired_bytes);
            debug!("Swept {} expired entries during invalidation", expired.len());
        }
        matched.len()
    }

    fn remove_keys(&mut self, keys: &[String]) -> u64 {
        keys.iter()
            .filter_map(|key| self.entries.remove(key))
            .map(|entry| entry.size_bytes)
            .sum()
    }
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::new(RelationGraph::default(), DEFAULT_CASCADE_DEPTH)
    }
}
