//! Error types for the cache engine and its HTTP host
//!
//! The engine reports exactly two kinds of failure (read and write) by
//! rejecting the completion handle it returns. The HTTP layer wraps those in
//! `ApiError`, which knows how to render itself as a response.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Read Error ==
/// Reasons a read operation was refused.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReadError {
    /// Reads are only served while the cache is open
    #[error("cache object is not open")]
    NotOpen,
}

// == Write Error ==
/// Reasons a write operation was refused.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WriteError {
    /// The cache is not in a state that permits this write
    #[error("cache object is not open")]
    NotOpen,

    /// A TTL of zero was passed to `set_ttl`
    #[error("TTL needs to be higher than 0")]
    NonPositiveTtl,

    /// A TTL was requested for a key that holds no value
    #[error("timeout cannot be set on undefined key '{0}'")]
    UndefinedKey(String),

    /// Object values are disabled by configuration
    #[error("object values are not supported")]
    UnsupportedValue,

    /// The cache was dropped while the handle was still pending
    #[error("cache was dropped before the operation completed")]
    Abandoned,
}

// == Cache Error Enum ==
/// Unified error type for cache operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("read failure: {0}")]
    Read(#[from] ReadError),

    #[error("write failure: {0}")]
    Write(#[from] WriteError),
}

impl CacheError {
    pub fn is_read(&self) -> bool {
        matches!(self, CacheError::Read(_))
    }

    pub fn is_write(&self) -> bool {
        matches!(self, CacheError::Write(_))
    }
}

// == Result Type Alias ==
/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;

// == API Error ==
/// Errors surfaced by the HTTP handlers.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The engine rejected the operation
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// The request body or path could not be turned into an operation
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Cache(CacheError::Read(ReadError::NotOpen)) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ApiError::Cache(CacheError::Write(write)) => match write {
                WriteError::NotOpen => StatusCode::SERVICE_UNAVAILABLE,
                WriteError::NonPositiveTtl => StatusCode::BAD_REQUEST,
                WriteError::UndefinedKey(_) => StatusCode::NOT_FOUND,
                WriteError::UnsupportedValue => StatusCode::UNPROCESSABLE_ENTITY,
                WriteError::Abandoned => StatusCode::INTERNAL_SERVER_ERROR,
            },
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        let read: CacheError = ReadError::NotOpen.into();
        let write: CacheError = WriteError::NonPositiveTtl.into();

        assert!(read.is_read());
        assert!(!read.is_write());
        assert!(write.is_write());
    }

    #[test]
    fn test_error_messages() {
        let err: CacheError = WriteError::UndefinedKey("k".to_string()).into();
        assert_eq!(
            err.to_string(),
            "write failure: timeout cannot be set on undefined key 'k'"
        );
    }

    #[test]
    fn test_api_error_status_codes() {
        let cases = [
            (ApiError::InvalidRequest("x".into()), StatusCode::BAD_REQUEST),
            (
                ApiError::Cache(ReadError::NotOpen.into()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                ApiError::Cache(WriteError::UndefinedKey("k".into()).into()),
                StatusCode::NOT_FOUND,
            ),
            (
                ApiError::Cache(WriteError::UnsupportedValue.into()),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }
}
