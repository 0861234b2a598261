//! Stats Reporter Task
//!
//! Background task that periodically logs cache performance statistics.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::info;

use crate::services::SharedCache;

/// Spawns a background task that logs a statistics snapshot every
/// `interval_secs` seconds.
///
/// Only a read lock is taken, so reporting never changes the counters.
/// Returns `None` without spawning anything when the interval is 0.
///
/// # Example
/// ```ignore
/// let handle = spawn_stats_reporter(cache.clone(), 60);
/// // Later, during shutdown:
/// if let Some(handle) = handle {
///     handle.abort();
/// }
/// ```
pub fn spawn_stats_reporter(cache: SharedCache, interval_secs: u64) -> Option<JoinHandle<()>> {
    if interval_secs == 0 {
        info!("Stats reporter disabled");
        return None;
    }

    let interval = Duration::from_secs(interval_secs);

    Some(tokio::spawn(async move {
        info!(
            "Starting stats reporter with interval of {} seconds",
            interval_secs
        );

        loop {
            tokio::time::sleep(interval).await;

            let stats = cache.read().await.stats();
            info!(
                hits = stats.hits,
                misses = stats.misses,
                hit_rate = %stats.hit_rate,
                total_entries = stats.total_entries,
                invalidations = stats.invalidations,
                total_size = %stats.total_size_mb,
                performance_gain = %stats.performance_gain,
                "Cache performance statistics"
            );
        }
    }))
}
