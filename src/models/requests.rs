//! Request DTOs for the cache server API
//!
//! Defines the structure of incoming HTTP request bodies.

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

/// Maximum accepted key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;

/// Request body for the SET operation (PUT /set)
///
/// # Fields
/// - `key`: The cache key to store the value under
/// - `value`: Any JSON value
/// - `ttl`: Optional TTL in seconds; fractions allowed, 0 means none
#[derive(Debug, Clone, Deserialize)]
pub struct SetRequest {
    /// The cache key
    pub key: String,
    /// The value to store
    pub value: Value,
    /// Optional TTL in seconds
    #[serde(default)]
    pub ttl: Option<f64>,
}

impl SetRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if let Some(message) = validate_key(&self.key) {
            return Some(message);
        }
        if let Some(ttl) = self.ttl {
            if let Err(message) = ttl_from_secs(ttl) {
                return Some(message);
            }
        }
        None
    }

    /// TTL as a duration; `None` when absent or zero.
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
            .and_then(|secs| ttl_from_secs(secs).ok())
            .filter(|ttl| !ttl.is_zero())
    }
}

/// Request body for PUT /ttl/:key
#[derive(Debug, Clone, Deserialize)]
pub struct TtlRequest {
    /// TTL in seconds
    pub ttl: f64,
}

/// Checks a key taken from a body or a path.
pub fn validate_key(key: &str) -> Option<String> {
    if key.is_empty() {
        return Some("Key cannot be empty".to_string());
    }
    if key.len() > MAX_KEY_LENGTH {
        return Some(format!(
            "Key exceeds maximum length of {} characters",
            MAX_KEY_LENGTH
        ));
    }
    None
}

/// Converts seconds into a duration, refusing negative or non-finite input.
pub fn ttl_from_secs(secs: f64) -> Result<Duration, String> {
    Duration::try_from_secs_f64(secs).map_err(|_| format!("Invalid TTL: {}", secs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_request_deserialize() {
        let json = r#"{"key": "test", "value": "hello"}"#;
        let req: SetRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.key, "test");
        assert_eq!(req.value, json!("hello"));
        assert!(req.ttl.is_none());
        assert!(req.ttl().is_none());
    }

    #[test]
    fn test_set_request_structured_value() {
        let json = r#"{"key": "test", "value": {"n": [1, 2]}, "ttl": 0.5}"#;
        let req: SetRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.value, json!({"n": [1, 2]}));
        assert_eq!(req.ttl(), Some(Duration::from_millis(500)));
    }

    #[test]
    fn test_zero_ttl_means_none() {
        let json = r#"{"key": "test", "value": 1, "ttl": 0}"#;
        let req: SetRequest = serde_json::from_str(json).unwrap();
        assert!(req.validate().is_none());
        assert!(req.ttl().is_none());
    }

    #[test]
    fn test_validate_empty_key() {
        let req = SetRequest {
            key: "".to_string(),
            value: json!("test"),
            ttl: None,
        };
        assert!(req.validate().is_some());
    }

    #[test]
    fn test_validate_negative_ttl() {
        let req = SetRequest {
            key: "k".to_string(),
            value: json!("test"),
            ttl: Some(-1.0),
        };
        assert!(req.validate().is_some());
    }

    #[test]
    fn test_validate_valid_request() {
        let req = SetRequest {
            key: "valid_key".to_string(),
            value: json!("test"),
            ttl: Some(60.0),
        };
        assert!(req.validate().is_none());
    }
}
