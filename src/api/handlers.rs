//! API Handlers
//!
//! HTTP request handlers, each mapped onto one cache operation.

use axum::{
    extract::{Path, State},
    Json,
};

use crate::cache::Cache;
use crate::error::ApiError;
use crate::models::requests::{ttl_from_secs, validate_key};
use crate::models::{
    GetResponse, HealthResponse, KeyFlagResponse, KeysResponse, MessageResponse, SetRequest,
    SetResponse, StatsResponse, TtlRequest, TtlResponse,
};

/// Result type returned by every handler.
pub type ApiResult<T> = std::result::Result<Json<T>, ApiError>;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Handle to the hosted cache
    pub cache: Cache,
}

impl AppState {
    /// Creates a new AppState around an existing cache handle.
    pub fn new(cache: Cache) -> Self {
        Self { cache }
    }
}

fn checked_key(key: String) -> std::result::Result<String, ApiError> {
    match validate_key(&key) {
        Some(message) => Err(ApiError::InvalidRequest(message)),
        None => Ok(key),
    }
}

/// Handler for PUT /set
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> ApiResult<SetResponse> {
    if let Some(error_msg) = req.validate() {
        return Err(ApiError::InvalidRequest(error_msg));
    }

    let ttl = req.ttl();
    let value = state.cache.set(&req.key, req.value, ttl).await?;
    Ok(Json(SetResponse::new(req.key, value)))
}

/// Handler for GET /get/:key
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> ApiResult<GetResponse> {
    let key = checked_key(key)?;
    let value = state.cache.get(&key).await?;
    Ok(Json(GetResponse::new(key, value)))
}

/// Handler for DELETE /del/:key
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> ApiResult<KeyFlagResponse> {
    let key = checked_key(key)?;
    let removed = state.cache.remove(&key).await?;
    Ok(Json(KeyFlagResponse::new(key, removed)))
}

/// Handler for GET /exists/:key
pub async fn exists_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> ApiResult<KeyFlagResponse> {
    let key = checked_key(key)?;
    let exists = state.cache.exists(&key).await?;
    Ok(Json(KeyFlagResponse::new(key, exists)))
}

/// Handler for PUT /ttl/:key
pub async fn set_ttl_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(req): Json<TtlRequest>,
) -> ApiResult<TtlResponse> {
    let key = checked_key(key)?;
    let ttl = ttl_from_secs(req.ttl).map_err(ApiError::InvalidRequest)?;
    let ttl = state.cache.set_ttl(&key, ttl).await?;
    Ok(Json(TtlResponse::new(key, ttl)))
}

/// Handler for GET /ttl/:key
pub async fn get_ttl_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> ApiResult<TtlResponse> {
    let key = checked_key(key)?;
    let ttl = state.cache.get_ttl(&key).await?;
    Ok(Json(TtlResponse::new(key, ttl)))
}

/// Handler for DELETE /ttl/:key
pub async fn remove_ttl_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> ApiResult<KeyFlagResponse> {
    let key = checked_key(key)?;
    let removed = state.cache.remove_ttl(&key).await?;
    Ok(Json(KeyFlagResponse::new(key, removed)))
}

/// Handler for GET /keys
pub async fn keys_handler(State(state): State<AppState>) -> ApiResult<KeysResponse> {
    let keys = state.cache.keys().await?;
    Ok(Json(KeysResponse { keys }))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> ApiResult<StatsResponse> {
    let stats = state.cache.stats().await?;
    Ok(Json(StatsResponse::from(stats)))
}

/// Handler for POST /flush
pub async fn flush_handler(State(state): State<AppState>) -> ApiResult<MessageResponse> {
    state.cache.flush().await?;
    Ok(Json(MessageResponse::new("Cache flushed")))
}

/// Handler for GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::for_state(state.cache.state()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheConfig;
    use crate::error::{CacheError, WriteError};
    use crate::scheduler::ManualLoop;
    use serde_json::json;

    fn open_state() -> AppState {
        let cache = Cache::new(ManualLoop::new(), CacheConfig::default());
        let _ = cache.start();
        AppState::new(cache)
    }

    #[tokio::test]
    async fn test_set_and_get_handler() {
        let state = open_state();

        let req = SetRequest {
            key: "test_key".to_string(),
            value: json!("test_value"),
            ttl: None,
        };
        let result = set_handler(State(state.clone()), Json(req)).await;
        assert!(result.is_ok());

        let response = get_handler(State(state), Path("test_key".to_string()))
            .await
            .unwrap();
        assert!(response.found);
        assert_eq!(response.value, json!("test_value"));
    }

    #[tokio::test]
    async fn test_get_nonexistent_key() {
        let state = open_state();

        let response = get_handler(State(state), Path("nonexistent".to_string()))
            .await
            .unwrap();
        assert!(!response.found);
        assert_eq!(response.value, json!(null));
    }

    #[tokio::test]
    async fn test_delete_handler() {
        let state = open_state();
        let _ = state.cache.set("to_delete", json!(1), None);

        let response = delete_handler(State(state.clone()), Path("to_delete".to_string()))
            .await
            .unwrap();
        assert!(response.result);

        let response = delete_handler(State(state), Path("to_delete".to_string()))
            .await
            .unwrap();
        assert!(!response.result);
    }

    #[tokio::test]
    async fn test_ttl_handlers() {
        let state = open_state();
        let _ = state.cache.set("k", json!(1), None);

        let set = set_ttl_handler(
            State(state.clone()),
            Path("k".to_string()),
            Json(TtlRequest { ttl: 2.5 }),
        )
        .await
        .unwrap();
        assert_eq!(set.ttl, 2.5);

        let got = get_ttl_handler(State(state.clone()), Path("k".to_string()))
            .await
            .unwrap();
        assert_eq!(got.ttl, 2.5);

        let removed = remove_ttl_handler(State(state), Path("k".to_string()))
            .await
            .unwrap();
        assert!(removed.result);
    }

    #[tokio::test]
    async fn test_set_ttl_on_missing_key() {
        let state = open_state();

        let result = set_ttl_handler(
            State(state),
            Path("missing".to_string()),
            Json(TtlRequest { ttl: 1.0 }),
        )
        .await;
        assert!(matches!(
            result,
            Err(ApiError::Cache(CacheError::Write(WriteError::UndefinedKey(_))))
        ));
    }

    #[tokio::test]
    async fn test_handlers_when_closed() {
        let state = AppState::new(Cache::new(ManualLoop::new(), CacheConfig::default()));

        assert!(keys_handler(State(state.clone())).await.is_err());
        assert!(stats_handler(State(state.clone())).await.is_err());
        assert_eq!(health_handler(State(state)).await.status, "unavailable");
    }

    #[tokio::test]
    async fn test_set_invalid_request() {
        let state = open_state();

        let req = SetRequest {
            key: "".to_string(),
            value: json!("value"),
            ttl: None,
        };
        let result = set_handler(State(state), Json(req)).await;
        assert!(matches!(result, Err(ApiError::InvalidRequest(_))));
    }
}
