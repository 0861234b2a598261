//! Response DTOs for the admin API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;
use serde_json::Value;

use crate::cache::{CacheStatsSnapshot, CascadeOutcome};

/// Response body for GET /entries/:key
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    /// The requested key
    pub key: String,
    /// The cached payload
    pub value: Value,
}

impl GetResponse {
    /// Creates a new GetResponse
    pub fn new(key: impl Into<String>, value: Value) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// Response body for PUT /entries
#[derive(Debug, Clone, Serialize)]
pub struct SetResponse {
    /// Success message
    pub message: String,
    /// The key that was set
    pub key: String,
    /// TTL applied to the entry
    pub ttl_ms: u64,
}

impl SetResponse {
    /// Creates a new SetResponse
    pub fn new(key: impl Into<String>, ttl_ms: u64) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' set successfully", key),
            key,
            ttl_ms,
        }
    }
}

/// Response body for DELETE /entries/:key
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    /// Success message
    pub message: String,
    /// The key that was deleted
    pub key: String,
}

impl DeleteResponse {
    /// Creates a new DeleteResponse
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' deleted successfully", key),
            key,
        }
    }
}

/// Response body for the bulk invalidation endpoints
#[derive(Debug, Clone, Serialize)]
pub struct InvalidationResponse {
    /// What was invalidated, e.g. "group:meal"
    pub scope: String,
    /// Entries removed
    pub removed: usize,
    /// Groups traversed by a cascade, absent for other invalidations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groups_visited: Option<usize>,
}

impl InvalidationResponse {
    /// Creates a response for a non-cascading invalidation
    pub fn new(scope: impl Into<String>, removed: usize) -> Self {
        Self {
            scope: scope.into(),
            removed,
            groups_visited: None,
        }
    }

    /// Creates a response for a cascade
    pub fn cascade(scope: impl Into<String>, outcome: CascadeOutcome) -> Self {
        Self {
            scope: scope.into(),
            removed: outcome.removed,
            groups_visited: Some(outcome.groups_visited),
        }
    }
}

/// Response body for GET /stats and POST /stats/reset
pub type StatsResponse = CacheStatsSnapshot;

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_response_serialize() {
        let resp = GetResponse::new("meal:details:42", json!({"calories": 500}));
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["key"], "meal:details:42");
        assert_eq!(json["value"]["calories"], 500);
    }

    #[test]
    fn test_set_response_serialize() {
        let resp = SetResponse::new("my_key", 900_000);
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("my_key"));
        assert!(json.contains("successfully"));
        assert!(json.contains("900000"));
    }

    #[test]
    fn test_invalidation_response_omits_groups_when_not_cascading() {
        let json = serde_json::to_value(InvalidationResponse::new("group:meal", 3)).unwrap();
        assert_eq!(json["removed"], 3);
        assert!(json.get("groups_visited").is_none());

        let outcome = CascadeOutcome {
            removed: 4,
            groups_visited: 3,
        };
        let json = serde_json::to_value(InvalidationResponse::cascade("entity:meal/42", outcome))
            .unwrap();
        assert_eq!(json["groups_visited"], 3);
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy();
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
    }
}
