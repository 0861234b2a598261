//! Cache Groups and Durations
//!
//! Named entity categories used for bulk invalidation, and the named
//! time-to-live tiers applied to them.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::CacheError;

// == Cache Duration ==
/// Named TTL tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheDuration {
    /// 5 minutes, for data that changes constantly (daily progress)
    Short,
    /// 15 minutes, the default for user-owned data
    Medium,
    /// 1 hour, for context handed to the generation services
    IaContext,
    /// 24 hours, for reference data that rarely changes
    Long,
}

impl CacheDuration {
    /// Returns the TTL in milliseconds.
    pub const fn as_millis(self) -> u64 {
        match self {
            CacheDuration::Short => 5 * 60 * 1000,
            CacheDuration::Medium => 15 * 60 * 1000,
            CacheDuration::IaContext => 60 * 60 * 1000,
            CacheDuration::Long => 24 * 60 * 60 * 1000,
        }
    }

    /// Returns the TTL as a `Duration`.
    pub const fn as_duration(self) -> Duration {
        Duration::from_millis(self.as_millis())
    }
}

impl From<CacheDuration> for Duration {
    fn from(duration: CacheDuration) -> Self {
        duration.as_duration()
    }
}

// == Cache Group ==
/// Entity category an entry belongs to.
///
/// The serialized name is also the first segment of every key built by
/// [`crate::cache::build_cache_key`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheGroup {
    Meal,
    Plan,
    Ingredient,
    User,
    Progress,
    IaContext,
}

impl CacheGroup {
    /// All groups, in declaration order.
    pub const ALL: [CacheGroup; 6] = [
        CacheGroup::Meal,
        CacheGroup::Plan,
        CacheGroup::Ingredient,
        CacheGroup::User,
        CacheGroup::Progress,
        CacheGroup::IaContext,
    ];

    /// Canonical key segment for this group.
    pub const fn as_str(self) -> &'static str {
        match self {
            CacheGroup::Meal => "meal",
            CacheGroup::Plan => "plan",
            CacheGroup::Ingredient => "ingredient",
            CacheGroup::User => "user",
            CacheGroup::Progress => "progress",
            CacheGroup::IaContext => "ia_context",
        }
    }
}

impl fmt::Display for CacheGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CacheGroup {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CacheGroup::ALL
            .into_iter()
            .find(|group| group.as_str() == s)
            .ok_or_else(|| CacheError::InvalidRequest(format!("Unknown cache group: {}", s)))
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_values() {
        assert_eq!(CacheDuration::Short.as_millis(), 300_000);
        assert_eq!(CacheDuration::Medium.as_millis(), 900_000);
        assert_eq!(CacheDuration::IaContext.as_millis(), 3_600_000);
        assert_eq!(CacheDuration::Long.as_millis(), 86_400_000);
        assert_eq!(
            Duration::from(CacheDuration::Medium),
            Duration::from_secs(15 * 60)
        );
    }

    #[test]
    fn test_group_names_roundtrip_through_from_str() {
        for group in CacheGroup::ALL {
            assert_eq!(group.as_str().parse::<CacheGroup>().unwrap(), group);
        }
    }

    #[test]
    fn test_group_unknown_name() {
        assert!(matches!(
            "recipe".parse::<CacheGroup>(),
            Err(CacheError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_group_serde_matches_key_segment() {
        let json = serde_json::to_string(&CacheGroup::IaContext).unwrap();
        assert_eq!(json, "\"ia_context\"");

        let group: CacheGroup = serde_json::from_str("\"progress\"").unwrap();
        assert_eq!(group, CacheGroup::Progress);
    }
}
