//! Configuration Module
//!
//! Loads the service configuration from environment variables.

use std::env;
use std::str::FromStr;

use crate::cache::DEFAULT_CASCADE_DEPTH;

/// Service configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP port of the admin API
    pub server_port: u16,
    /// Relation hops followed by cascading invalidation
    pub cascade_depth: u32,
    /// Seconds between statistics reports, 0 disables reporting
    pub stats_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - Admin API port (default: 3000)
    /// - `CASCADE_DEPTH` - Cascade depth (default: 2)
    /// - `STATS_INTERVAL` - Stats report interval in seconds (default: 60)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: env_or("SERVER_PORT", defaults.server_port),
            cascade_depth: env_or("CASCADE_DEPTH", defaults.cascade_depth),
            stats_interval: env_or("STATS_INTERVAL", defaults.stats_interval),
        }
    }
}

/// Reads `name`, falling back to `default` when unset or unparseable.
fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            cascade_depth: DEFAULT_CASCADE_DEPTH,
            stats_interval: 60,
        }
    }
}
