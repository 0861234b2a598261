//! API Handlers
//!
//! HTTP request handlers for the cache admin and monitoring endpoints.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use tokio::sync::RwLock;
use tracing::info;

use crate::cache::{
    get_cache_duration, CacheGroup, CacheKey, CacheStore, EntityId, RelationGraph, DEFAULT_TTL,
};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{
    DeleteResponse, EntityInvalidationQuery, GetResponse, HealthResponse, InvalidationResponse,
    SetRequest, SetResponse, StatsResponse,
};
use crate::services::SharedCache;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The process-wide cache instance
    pub cache: SharedCache,
}

impl AppState {
    /// Creates a new AppState owning the given cache store.
    pub fn new(cache: CacheStore) -> Self {
        Self {
            cache: Arc::new(RwLock::new(cache)),
        }
    }

    /// Creates a new AppState from configuration.
    pub fn from_config(config: &Config) -> Self {
        let cache = CacheStore::new(RelationGraph::default(), config.cascade_depth);
        Self::new(cache)
    }
}

/// Handler for PUT /entries
///
/// Stores a payload. Without an explicit TTL, the TTL configured for the
/// key's group and subtype applies.
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let ttl = match req.ttl_ms {
        Some(ttl_ms) => Duration::from_millis(ttl_ms),
        None => CacheKey::parse(&req.key)
            .map(|key| get_cache_duration(key.group(), key.subtype()))
            .unwrap_or(DEFAULT_TTL)
            .as_duration(),
    };

    let mut cache = state.cache.write().await;
    cache.set(req.key.clone(), req.value, req.group, ttl);

    Ok(Json(SetResponse::new(req.key, ttl.as_millis() as u64)))
}

/// Handler for GET /entries/:key
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    // Write lock: lookups update statistics and drop expired entries
    let mut cache = state.cache.write().await;
    let value = cache
        .get(&key)
        .ok_or_else(|| CacheError::NotFound(key.clone()))?;

    Ok(Json(GetResponse::new(key, value)))
}

/// Handler for DELETE /entries/:key
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    let mut cache = state.cache.write().await;
    if !cache.delete(&key) {
        return Err(CacheError::NotFound(key));
    }

    Ok(Json(DeleteResponse::new(key)))
}

/// Handler for DELETE /entries
pub async fn clear_handler(State(state): State<AppState>) -> Json<InvalidationResponse> {
    let removed = state.cache.write().await.clear();
    Json(InvalidationResponse::new("all", removed))
}

/// Handler for DELETE /groups/:group
pub async fn invalidate_group_handler(
    State(state): State<AppState>,
    Path(group): Path<String>,
) -> Result<Json<InvalidationResponse>> {
    let group: CacheGroup = group.parse()?;
    let removed = state.cache.write().await.invalidate_by_group(group);

    Ok(Json(InvalidationResponse::new(
        format!("group:{}", group),
        removed,
    )))
}

/// Handler for DELETE /prefixes/:prefix
pub async fn invalidate_prefix_handler(
    State(state): State<AppState>,
    Path(prefix): Path<String>,
) -> Json<InvalidationResponse> {
    let removed = state.cache.write().await.invalidate_by_prefix(&prefix);
    Json(InvalidationResponse::new(format!("prefix:{}", prefix), removed))
}

/// Handler for DELETE /entities/:group/:id
///
/// Cascades through dependent groups unless `cascade=false` is given.
pub async fn invalidate_entity_handler(
    State(state): State<AppState>,
    Path((group, id)): Path<(String, String)>,
    Query(query): Query<EntityInvalidationQuery>,
) -> Result<Json<InvalidationResponse>> {
    let group: CacheGroup = group.parse()?;
    let scope = format!("entity:{}/{}", group, id);
    let entity_id = EntityId::from(id);
    let mut cache = state.cache.write().await;

    if query.cascade == Some(false) {
        let removed = cache.invalidate_entity(group, entity_id);
        return Ok(Json(InvalidationResponse::new(scope, removed)));
    }

    let depth = query.depth.unwrap_or_else(|| cache.cascade_depth());
    let outcome = cache.invalidate_entity_cascade_with_depth(group, entity_id, depth);
    Ok(Json(InvalidationResponse::cascade(scope, outcome)))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let cache = state.cache.read().await;
    Json(cache.stats())
}

/// Handler for POST /stats/reset
///
/// Logs the current statistics, resets them, and returns what was logged.
pub async fn reset_stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let mut cache = state.cache.write().await;
    let stats = cache.stats();
    info!(
        hits = stats.hits,
        misses = stats.misses,
        hit_rate = %stats.hit_rate,
        total_entries = stats.total_entries,
        invalidations = stats.invalidations,
        "Cache performance statistics"
    );
    cache.reset_stats();

    Json(stats)
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
