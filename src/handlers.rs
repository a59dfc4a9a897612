use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer, cors::CorsLayer, limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::dispatch;
use crate::errors::AppError;
use crate::store::KvStore;

/// Shared application state injected into handlers.
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Resilient client for the score/interest store, shared by all workers.
    pub store: Arc<dyn KvStore>,
}

/// Builds the application router with the shared middleware stack.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/method", post(method))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                // Request size limit: 1MB max payload
                .layer(RequestBodyLimitLayer::new(1024 * 1024))
                // Unexpected handler panics become generic 500 envelopes
                .layer(CatchPanicLayer::custom(handle_panic)),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Health check endpoint.
///
/// Reports the service status, version and the configured store endpoint;
/// bypasses the method pipeline.
pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "rust-scoring-api",
            "version": "0.1.0",
            "store": state.config.store_url,
        })),
    )
}

/// POST /method
///
/// The single RPC entry point. Decodes the JSON body (malformed bodies stop
/// here with 400, before the core pipeline), runs the dispatcher and wraps
/// its outcome in the reply envelope: `{"response": ..., "code": 200}` on
/// success, `{"error": ..., "code": ...}` otherwise, with the HTTP status
/// mirroring `code`.
pub async fn method(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    let request_id = request_id(&headers);

    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => {
            tracing::warn!(%request_id, "Malformed request body: {}", rejection);
            return AppError::BadRequest(rejection.to_string()).into_response();
        }
    };

    match dispatch::method_handler(&body, state.store.as_ref()).await {
        Ok(outcome) => {
            tracing::info!(
                %request_id,
                context = %outcome.context,
                "Request completed"
            );
            let envelope = json!({ "response": outcome.payload, "code": 200 });
            (StatusCode::OK, Json(envelope)).into_response()
        }
        Err(error) => {
            tracing::info!(%request_id, %error, "Request rejected");
            error.into_response()
        }
    }
}

/// Request id from the `X-Request-Id` header, or a fresh UUID.
fn request_id(headers: &HeaderMap) -> String {
    headers
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().simple().to_string())
}

/// Maps a handler panic to the generic 500 envelope.
///
/// Wired through `CatchPanicLayer` in `main`; the panic payload is logged
/// and never reaches the caller.
pub fn handle_panic(panic: Box<dyn std::any::Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    AppError::Internal(detail).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use axum::http::HeaderValue;

    fn state() -> Arc<AppState> {
        Arc::new(AppState {
            config: Config {
                port: 8080,
                store_url: "redis://127.0.0.1:6379/0".to_string(),
                store_connect_attempts: 1,
                store_retry_backoff_ms: 10,
                store_op_timeout_ms: 100,
            },
            store: Arc::new(MemoryStore::new()),
        })
    }

    #[test]
    fn request_id_prefers_the_header() {
        let mut headers = HeaderMap::new();
        headers.insert("x-request-id", HeaderValue::from_static("abc-123"));
        assert_eq!(request_id(&headers), "abc-123");
    }

    #[test]
    fn request_id_falls_back_to_a_uuid() {
        let generated = request_id(&HeaderMap::new());
        assert_eq!(generated.len(), 32);
        assert!(generated.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[tokio::test]
    async fn health_reports_status_and_store_endpoint() {
        let (status, Json(body)) = health(State(state())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["store"], "redis://127.0.0.1:6379/0");
    }

    #[test]
    fn panics_map_to_the_internal_envelope() {
        let response = handle_panic(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
