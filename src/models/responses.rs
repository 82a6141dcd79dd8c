//! Response DTOs for the cache server API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;
use serde_json::Value;

use crate::cache::{CacheStats, LifecycleState};

/// Response body for the GET operation (GET /get/:key)
///
/// An unset key is not an error: `found` is false and `value` is null.
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    /// The requested key
    pub key: String,
    /// Whether a value is stored under the key
    pub found: bool,
    /// The stored value, or null
    pub value: Value,
}

impl GetResponse {
    pub fn new(key: impl Into<String>, value: Option<Value>) -> Self {
        Self {
            key: key.into(),
            found: value.is_some(),
            value: value.unwrap_or(Value::Null),
        }
    }
}

/// Response body for the SET operation (PUT /set)
#[derive(Debug, Clone, Serialize)]
pub struct SetResponse {
    /// Success message
    pub message: String,
    /// The key that was set
    pub key: String,
    /// The value that was stored
    pub value: Value,
}

impl SetResponse {
    pub fn new(key: impl Into<String>, value: Value) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' set successfully", key),
            key,
            value,
        }
    }
}

/// Response body for boolean key operations (remove, exists, TTL checks)
#[derive(Debug, Clone, Serialize)]
pub struct KeyFlagResponse {
    /// The key the operation applied to
    pub key: String,
    /// Operation outcome
    pub result: bool,
}

impl KeyFlagResponse {
    pub fn new(key: impl Into<String>, result: bool) -> Self {
        Self {
            key: key.into(),
            result,
        }
    }
}

/// Response body for TTL reads and writes (GET|PUT /ttl/:key)
#[derive(Debug, Clone, Serialize)]
pub struct TtlResponse {
    /// The key the TTL belongs to
    pub key: String,
    /// TTL in seconds, 0 when the key has none
    pub ttl: f64,
}

impl TtlResponse {
    pub fn new(key: impl Into<String>, ttl: std::time::Duration) -> Self {
        Self {
            key: key.into(),
            ttl: ttl.as_secs_f64(),
        }
    }
}

/// Response body for GET /keys
#[derive(Debug, Clone, Serialize)]
pub struct KeysResponse {
    pub keys: Vec<String>,
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub stats: CacheStats,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl From<CacheStats> for StatsResponse {
    fn from(stats: CacheStats) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            stats,
        }
    }
}

/// Response body for POST /flush
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// "healthy" while the cache is open, otherwise "unavailable"
    pub status: String,
    /// Lifecycle state of the cache
    pub state: LifecycleState,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    pub fn for_state(state: LifecycleState) -> Self {
        let status = if state == LifecycleState::Open {
            "healthy"
        } else {
            "unavailable"
        };
        Self {
            status: status.to_string(),
            state,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
