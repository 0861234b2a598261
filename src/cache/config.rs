//! Cache TTL Configuration
//!
//! Static table deciding how long each kind of data may be served from
//! the cache before it must be fetched again.

use crate::cache::{CacheDuration, CacheGroup};

/// Explicit (group, subtype) TTLs.
const TTL_TABLE: &[(CacheGroup, &str, CacheDuration)] = &[
    (CacheGroup::User, "preferences", CacheDuration::Medium),
    (CacheGroup::User, "details", CacheDuration::Medium),
    (CacheGroup::User, "context", CacheDuration::IaContext),
    (CacheGroup::Meal, "list", CacheDuration::Medium),
    (CacheGroup::Meal, "details", CacheDuration::Medium),
    (CacheGroup::Meal, "favorites", CacheDuration::Medium),
    (CacheGroup::Plan, "list", CacheDuration::Medium),
    (CacheGroup::Plan, "details", CacheDuration::Medium),
    (CacheGroup::Plan, "current", CacheDuration::Medium),
    // Ingredients are reference data and rarely change
    (CacheGroup::Ingredient, "list", CacheDuration::Long),
    (CacheGroup::Ingredient, "details", CacheDuration::Long),
    (CacheGroup::Progress, "daily", CacheDuration::Short),
    (CacheGroup::Progress, "history", CacheDuration::Medium),
    (CacheGroup::IaContext, "userContext", CacheDuration::IaContext),
];

// == Group Default ==
/// TTL applied to subtypes missing from the table.
pub const fn group_default_duration(group: CacheGroup) -> CacheDuration {
    match group {
        CacheGroup::Ingredient => CacheDuration::Long,
        CacheGroup::IaContext => CacheDuration::IaContext,
        CacheGroup::Progress => CacheDuration::Short,
        CacheGroup::Meal | CacheGroup::Plan | CacheGroup::User => CacheDuration::Medium,
    }
}

// == Get Cache Duration ==
/// Resolves the TTL for `subtype` data in `group`.
///
/// Falls back to the group default when the pair is not configured.
pub fn get_cache_duration(group: CacheGroup, subtype: &str) -> CacheDuration {
    TTL_TABLE
        .iter()
        .find(|(g, s, _)| *g == group && *s == subtype)
        .map(|(_, _, duration)| *duration)
        .unwrap_or_else(|| group_default_duration(group))
}
