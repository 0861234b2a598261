//! Cached Query Service
//!
//! The read-through and invalidate-on-write contract data-access services
//! follow around the cache: look up first, fetch and store on a miss, and
//! cascade invalidation after every mutation.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use crate::cache::{get_cache_duration, CacheGroup, CacheKey, CascadeOutcome, EntityId};
use crate::error::CacheError;
use crate::services::SharedCache;

// == Cached Query ==
/// Read-through access to a shared cache with at most one in-flight fetch
/// per key.
///
/// Callers racing on the same missing key wait for the first fetch and are
/// then served from the cache, instead of each fetching and overwriting
/// one another.
#[derive(Clone)]
pub struct CachedQuery {
    cache: SharedCache,
    in_flight: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl CachedQuery {
    /// Creates a query helper over `cache`.
    pub fn new(cache: SharedCache) -> Self {
        Self {
            cache,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// The underlying cache.
    pub fn cache(&self) -> &SharedCache {
        &self.cache
    }

    // == Get Or Fetch ==
    /// Returns the cached value for `key`, or runs `fetch`, stores its
    /// result with the TTL configured for the key's group and subtype, and
    /// returns it.
    ///
    /// Fetch errors are returned unchanged and nothing is cached.
    pub async fn get_or_fetch<T, E, F, Fut>(&self, key: &CacheKey, fetch: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        E: From<CacheError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let key_str = key.to_string();
        if let Some(cached) = self.cache.write().await.get_as::<T>(&key_str)? {
            return Ok(cached);
        }

        let slot = self.slot(&key_str).await;
        let outcome = self.fetch_once(&slot, key, &key_str, fetch).await;
        drop(slot);
        self.release(&key_str).await;
        outcome
    }

    async fn fetch_once<T, E, F, Fut>(
        &self,
        slot: &Mutex<()>,
        key: &CacheKey,
        key_str: &str,
        fetch: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        E: From<CacheError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let _guard = match slot.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                debug!("Waiting for in-flight fetch: {}", key_str);
                slot.lock().await
            }
        };

        // A fetch may have completed between the caller's miss and taking the slot
        {
            let mut cache = self.cache.write().await;
            if cache.has(key_str) {
                if let Some(cached) = cache.get_as::<T>(key_str)? {
                    return Ok(cached);
                }
            }
        }

        let started = Instant::now();
        let value = fetch().await?;
        let elapsed = started.elapsed();

        let ttl = get_cache_duration(key.group(), key.subtype());
        let mut cache = self.cache.write().await;
        cache.record_access_time_without_cache(elapsed);
        cache.set_as(key_str, &value, key.group(), ttl)?;
        debug!(
            "Stored {} for {}s after {:.2}ms fetch",
            key_str,
            ttl.as_millis() / 1000,
            elapsed.as_secs_f64() * 1000.0
        );
        Ok(value)
    }

    async fn slot(&self, key: &str) -> Arc<Mutex<()>> {
        let mut slots = self.in_flight.lock().await;
        slots.entry(key.to_string()).or_default().clone()
    }

    /// Drops the slot for `key` once no caller holds it.
    async fn release(&self, key: &str) {
        let mut slots = self.in_flight.lock().await;
        if slots.get(key).is_some_and(|slot| Arc::strong_count(slot) == 1) {
            slots.remove(key);
        }
    }

    // == Mutation Hooks ==
    /// Call after creating, updating or deleting one entity.
    pub async fn invalidate_after_mutation(
        &self,
        group: CacheGroup,
        entity_id: impl Into<EntityId>,
    ) -> CascadeOutcome {
        self.cache
            .write()
            .await
            .invalidate_entity_cascade(group, entity_id)
    }

    /// Call after changes with no single entity id, such as bulk imports.
    pub async fn invalidate_after_bulk_change(&self, group: CacheGroup) -> usize {
        self.cache.write().await.invalidate_by_group(group)
    }

    #[cfg(test)]
    async fn in_flight_len(&self) -> usize {
        self.in_flight.lock().await.len()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheStore;
    use serde::Deserialize;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use thiserror::Error;
    use tokio::sync::{Notify, RwLock};

    #[derive(Debug, Error)]
    enum RepoError {
        #[error("database unavailable")]
        Unavailable,
        #[error(transparent)]
        Cache(#[from] CacheError),
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Meal {
        id: i64,
        calories: u32,
    }

    fn query() -> CachedQuery {
        CachedQuery::new(Arc::new(RwLock::new(CacheStore::default())))
    }

    #[tokio::test]
    async fn test_fetches_on_miss_then_serves_from_cache() {
        let query = query();
        let fetches = &AtomicUsize::new(0);
        let key = CacheKey::new(CacheGroup::Meal, "details").with_id(42);

        for _ in 0..3 {
            let meal: Meal = query
                .get_or_fetch(&key, move || async move {
                    fetches.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, RepoError>(Meal { id: 42, calories: 500 })
                })
                .await
                .unwrap();
            assert_eq!(meal.calories, 500);
        }

        assert_eq!(fetches.load(Ordering::SeqCst), 1);
        let stats = query.cache().read().await.stats();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.total_entries, 1);
        assert_eq!(query.in_flight_len().await, 0);
    }

    #[tokio::test]
    async fn test_fetch_error_is_not_cached() {
        let query = query();
        let key = CacheKey::new(CacheGroup::Plan, "current").for_user(7);

        let result: Result<Meal, RepoError> = query
            .get_or_fetch(&key, || async { Err(RepoError::Unavailable) })
            .await;

        assert!(matches!(result, Err(RepoError::Unavailable)));
        assert!(query.cache().read().await.is_empty());
        assert_eq!(query.in_flight_len().await, 0);
    }

    #[tokio::test]
    async fn test_concurrent_callers_fetch_once() {
        let query = query();
        let fetches = &AtomicUsize::new(0);
        let key = CacheKey::new(CacheGroup::Ingredient, "details").with_id("3017620422003");

        let fetch = move || async move {
            fetches.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok::<_, RepoError>(Meal { id: 1, calories: 539 })
        };

        let (first, second) = tokio::join!(
            query.get_or_fetch(&key, fetch),
            query.get_or_fetch(&key, fetch)
        );

        assert_eq!(first.unwrap(), second.unwrap());
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
        assert_eq!(query.in_flight_len().await, 0);
    }

    #[tokio::test]
    async fn test_caller_taking_slot_after_fetch_completed_uses_cache() {
        let query = query();
        let fetches = Arc::new(AtomicUsize::new(0));
        let fetch_started = Arc::new(Notify::new());
        let finish_fetch = Arc::new(Notify::new());
        let key = CacheKey::new(CacheGroup::Meal, "details").with_id(42);

        let first = tokio::spawn({
            let (query, key, fetches) = (query.clone(), key.clone(), fetches.clone());
            let (fetch_started, finish_fetch) = (fetch_started.clone(), finish_fetch.clone());
            async move {
                query
                    .get_or_fetch(&key, move || async move {
                        fetches.fetch_add(1, Ordering::SeqCst);
                        fetch_started.notify_one();
                        finish_fetch.notified().await;
                        Ok::<_, RepoError>(Meal { id: 42, calories: 500 })
                    })
                    .await
            }
        });
        fetch_started.notified().await;

        // Second caller misses, then waits on the slot map while the first fetch runs
        let slots = query.in_flight.lock().await;
        let second = tokio::spawn({
            let (query, key, fetches) = (query.clone(), key.clone(), fetches.clone());
            async move {
                query
                    .get_or_fetch(&key, move || async move {
                        fetches.fetch_add(1, Ordering::SeqCst);
                        Ok::<_, RepoError>(Meal { id: 42, calories: 0 })
                    })
                    .await
            }
        });
        while query.cache().read().await.stats().misses < 2 {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }

        finish_fetch.notify_one();
        while !query.cache().read().await.contains_key(&key.to_string()) {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        drop(slots);

        let first = first.await.unwrap().unwrap();
        let second = second.await.unwrap().unwrap();
        assert_eq!(first, second);
        assert_eq!(second.calories, 500);
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
        assert_eq!(query.in_flight_len().await, 0);
    }

    #[tokio::test]
    async fn test_fetch_latency_recorded_with_configured_ttl() {
        let query = query();
        let key = CacheKey::new(CacheGroup::Progress, "daily").for_user(3);

        let _: Meal = query
            .get_or_fetch(&key, || async {
                tokio::time::sleep(Duration::from_millis(10)).await;
                Ok::<_, RepoError>(Meal { id: 0, calories: 1800 })
            })
            .await
            .unwrap();

        let stats = query.cache().read().await.stats();
        assert!(stats.average_access_time_without_cache_ms >= 10.0);
        assert!(query.cache().write().await.has("progress:daily:user_3"));
    }

    #[tokio::test]
    async fn test_decode_error_surfaces_as_cache_error() {
        let query = query();
        let key = CacheKey::new(CacheGroup::Meal, "details").with_id(9);
        query.cache().write().await.set(
            key.to_string(),
            serde_json::json!("not a meal"),
            CacheGroup::Meal,
            Duration::from_secs(60),
        );

        let result: Result<Meal, RepoError> = query
            .get_or_fetch(&key, || async { Ok(Meal { id: 9, calories: 1 }) })
            .await;

        assert!(matches!(result, Err(RepoError::Cache(CacheError::Serialization(_)))));
    }

    #[tokio::test]
    async fn test_mutation_hooks_invalidate() {
        let query = query();
        let details = CacheKey::new(CacheGroup::Meal, "details").with_id(42);
        let plans = CacheKey::new(CacheGroup::Plan, "list").for_user(7);

        for key in [&details, &plans] {
            let _: Meal = query
                .get_or_fetch(key, || async { Ok::<_, RepoError>(Meal { id: 42, calories: 500 }) })
                .await
                .unwrap();
        }

        let outcome = query.invalidate_after_mutation(CacheGroup::Meal, 42).await;
        assert_eq!(outcome.removed, 2);

        let ingredients = CacheKey::new(CacheGroup::Ingredient, "list");
        let _: Vec<String> = query
            .get_or_fetch(&ingredients, || async { Ok::<_, RepoError>(vec!["oat".to_string()]) })
            .await
            .unwrap();
        assert_eq!(query.invalidate_after_bulk_change(CacheGroup::Ingredient).await, 1);
        assert!(query.cache().read().await.is_empty());
    }
}
