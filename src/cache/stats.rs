//! Cache Statistics Module
//!
//! Tracks hits, misses, invalidations, access latency on both paths and an
//! estimate of the memory held by cached payloads.

use serde::Serialize;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

// == Cache Stats ==
/// Running cache metrics, one instance per cache.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// Lookups served from the cache
    pub hits: u64,
    /// Lookups that found nothing live
    pub misses: u64,
    /// Entries removed by delete, clear or invalidation
    pub invalidations: u64,
    /// Entries physically present
    pub total_entries: usize,
    /// Sum of hit-path latencies (ms)
    pub access_time_with_cache_sum_ms: f64,
    /// Sum of reported fetch latencies after a miss (ms)
    pub access_time_without_cache_sum_ms: f64,
    /// Number of fetch latencies reported
    pub uncached_samples: u64,
    /// Estimated bytes held by payloads
    pub total_size_bytes: u64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Lookups ==
    /// Counts a hit and its latency.
    pub fn record_hit(&mut self, elapsed_ms: f64) {
        self.hits += 1;
        self.access_time_with_cache_sum_ms += elapsed_ms;
    }

    /// Counts a miss.
    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    /// Adds the latency of a data-source fetch made after a miss.
    pub fn record_access_time_without_cache(&mut self, elapsed_ms: f64) {
        self.uncached_samples += 1;
        self.access_time_without_cache_sum_ms += elapsed_ms;
    }

    // == Physical State ==
    /// Accounts for a new key.
    pub fn entry_added(&mut self, size_bytes: u64) {
        self.total_entries += 1;
        self.total_size_bytes += size_bytes;
    }

    /// Accounts for a payload replaced in place.
    pub fn entry_replaced(&mut self, old_size: u64, new_size: u64) {
        self.total_size_bytes = self.total_size_bytes.saturating_sub(old_size) + new_size;
    }

    /// Accounts for entries dropped on expiry (not an invalidation).
    pub fn entries_expired(&mut self, count: usize, size_bytes: u64) {
        self.total_entries = self.total_entries.saturating_sub(count);
        self.total_size_bytes = self.total_size_bytes.saturating_sub(size_bytes);
    }

    /// Accounts for entries removed by delete, clear or invalidation.
    pub fn entries_invalidated(&mut self, count: usize, size_bytes: u64) {
        self.entries_expired(count, size_bytes);
        self.invalidations += count as u64;
    }

    /// Accounts for a full clear of `count` entries.
    pub fn entries_cleared(&mut self, count: usize) {
        self.invalidations += count as u64;
        self.total_entries = 0;
        self.total_size_bytes = 0;
    }

    // == Derived Metrics ==
    /// Returns hits / (hits + misses), or 0.0 before any lookup.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Mean hit-path latency in ms.
    pub fn average_access_time_with_cache(&self) -> f64 {
        average(self.access_time_with_cache_sum_ms, self.hits)
    }

    /// Mean fetch latency in ms.
    pub fn average_access_time_without_cache(&self) -> f64 {
        average(self.access_time_without_cache_sum_ms, self.uncached_samples)
    }

    /// How many times faster a hit is than a fetch, when both are known.
    pub fn performance_gain(&self) -> Option<f64> {
        let with_cache = self.average_access_time_with_cache();
        let without_cache = self.average_access_time_without_cache();
        if with_cache > 0.0 && without_cache > 0.0 {
            Some(without_cache / with_cache)
        } else {
            None
        }
    }

    // == Reset ==
    /// Zeroes activity counters, keeping entry count and size which
    /// describe what is physically stored.
    pub fn reset_activity(&mut self) {
        *self = Self {
            total_entries: self.total_entries,
            total_size_bytes: self.total_size_bytes,
            ..Self::default()
        };
    }

    // == Snapshot ==
    /// Raw counters plus formatted derived metrics.
    pub fn snapshot(&self) -> CacheStatsSnapshot {
        let hit_rate = if self.hits + self.misses == 0 {
            "0%".to_string()
        } else {
            format!("{:.2}%", self.hit_rate() * 100.0)
        };

        CacheStatsSnapshot {
            hits: self.hits,
            misses: self.misses,
            invalidations: self.invalidations,
            total_entries: self.total_entries,
            average_access_time_with_cache_ms: self.average_access_time_with_cache(),
            average_access_time_without_cache_ms: self.average_access_time_without_cache(),
            access_time_with_cache_sum_ms: self.access_time_with_cache_sum_ms,
            access_time_without_cache_sum_ms: self.access_time_without_cache_sum_ms,
            total_size_bytes: self.total_size_bytes,
            hit_rate,
            total_size_mb: format!("{:.2} MB", self.total_size_bytes as f64 / BYTES_PER_MB),
            performance_gain: self
                .performance_gain()
                .map(|gain| format!("{:.1}x", gain))
                .unwrap_or_else(|| "N/A".to_string()),
        }
    }
}

fn average(sum: f64, samples: u64) -> f64 {
    if samples == 0 {
        0.0
    } else {
        sum / samples as f64
    }
}

// == Stats Snapshot ==
/// Point-in-time view returned by `CacheStore::stats`.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub invalidations: u64,
    pub total_entries: usize,
    pub average_access_time_with_cache_ms: f64,
    pub average_access_time_without_cache_ms: f64,
    pub access_time_with_cache_sum_ms: f64,
    pub access_time_without_cache_sum_ms: f64,
    pub total_size_bytes: u64,
    /// Percentage with two decimals, or "0%" before any lookup
    pub hit_rate: String,
    pub total_size_mb: String,
    /// Fetch latency over hit latency, e.g. "12.5x", or "N/A"
    pub performance_gain: String,
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_new() {
        let stats = CacheStats::new();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.invalidations, 0);
        assert_eq!(stats.total_entries, 0);
        assert_eq!(stats.total_size_bytes, 0);
    }

    #[test]
    fn test_hit_rate_no_requests() {
        let stats = CacheStats::new();
        assert_eq!(stats.hit_rate(), 0.0);
        assert_eq!(stats.snapshot().hit_rate, "0%");
    }

    #[test]
    fn test_hit_rate_mixed() {
        let mut stats = CacheStats::new();
        stats.record_hit(0.1);
        stats.record_hit(0.1);
        stats.record_miss();
        assert!((stats.hit_rate() - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(stats.snapshot().hit_rate, "66.67%");
    }

    #[test]
    fn test_hit_rate_all_misses() {
        let mut stats = CacheStats::new();
        stats.record_miss();
        assert_eq!(stats.snapshot().hit_rate, "0.00%");
    }

    #[test]
    fn test_averages_and_gain() {
        let mut stats = CacheStats::new();
        stats.record_hit(0.5);
        stats.record_hit(1.5);
        stats.record_miss();
        stats.record_access_time_without_cache(20.0);

        assert_eq!(stats.average_access_time_with_cache(), 1.0);
        assert_eq!(stats.average_access_time_without_cache(), 20.0);
        assert_eq!(stats.snapshot().performance_gain, "20.0x");
    }

    #[test]
    fn test_gain_unavailable_without_both_paths() {
        let mut stats = CacheStats::new();
        assert_eq!(stats.snapshot().performance_gain, "N/A");

        stats.record_hit(0.2);
        assert_eq!(stats.snapshot().performance_gain, "N/A");
    }

    #[test]
    fn test_size_accounting() {
        let mut stats = CacheStats::new();
        stats.entry_added(100);
        stats.entry_added(50);
        stats.entry_replaced(100, 30);
        assert_eq!(stats.total_entries, 2);
        assert_eq!(stats.total_size_bytes, 80);

        stats.entries_invalidated(1, 30);
        assert_eq!(stats.total_entries, 1);
        assert_eq!(stats.total_size_bytes, 50);
        assert_eq!(stats.invalidations, 1);

        stats.entries_expired(1, 50);
        assert_eq!(stats.total_entries, 0);
        assert_eq!(stats.total_size_bytes, 0);
        assert_eq!(stats.invalidations, 1);
    }

    #[test]
    fn test_entries_cleared() {
        let mut stats = CacheStats::new();
        stats.entry_added(10);
        stats.entry_added(20);
        stats.entries_cleared(2);
        assert_eq!(stats.total_entries, 0);
        assert_eq!(stats.total_size_bytes, 0);
        assert_eq!(stats.invalidations, 2);
    }

    #[test]
    fn test_total_size_mb_format() {
        let mut stats = CacheStats::new();
        stats.entry_added(3 * 1024 * 1024 / 2);
        assert_eq!(stats.snapshot().total_size_mb, "1.50 MB");
    }

    #[test]
    fn test_reset_keeps_physical_state() {
        let mut stats = CacheStats::new();
        stats.entry_added(64);
        stats.record_hit(0.3);
        stats.record_miss();
        stats.record_access_time_without_cache(4.0);
        stats.invalidations = 5;

        stats.reset_activity();

        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.invalidations, 0);
        assert_eq!(stats.uncached_samples, 0);
        assert_eq!(stats.access_time_with_cache_sum_ms, 0.0);
        assert_eq!(stats.total_entries, 1);
        assert_eq!(stats.total_size_bytes, 64);
    }
}
