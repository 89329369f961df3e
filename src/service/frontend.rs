//! Frontend demo service: the entry point for external traffic.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::http::extract::TraceScopeLayer;
use crate::http::HttpClient;
use crate::observability::metrics;
use crate::pool::TaskPool;
use crate::resilience::OrFallback;
use crate::trace::context;

/// Number of jobs `/offload` hands to the pool per request.
const OFFLOAD_JOBS: usize = 5;

#[derive(Clone)]
pub struct FrontendState {
    pub pool: Arc<TaskPool>,
    pub client: HttpClient,
}

/// Build the frontend router with all middleware layers.
pub fn router(state: FrontendState, request_timeout: Duration) -> Router {
    Router::new()
        .route("/hello", get(hello))
        .route("/offload", get(offload))
        .route("/relay", get(relay))
        .route("/relay-fallback", get(relay_fallback))
        .route("/health", get(health))
        .with_state(state)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceScopeLayer)
        .layer(TraceLayer::new_for_http())
}

/// Log a line and hand the caller its trace id.
async fn hello() -> impl IntoResponse {
    tracing::info!("hello endpoint hit");
    metrics::record_request("hello", 200);
    Json(json!({ "message": "hello", "traceId": context::trace_id() }))
}

/// Offload a batch of jobs; each worker log line carries this request's id.
async fn offload(State(state): State<FrontendState>) -> impl IntoResponse {
    let mut scheduled = 0;
    for job in 0..OFFLOAD_JOBS {
        match state.pool.spawn(async move {
            tracing::info!(job, "offloaded job executed");
        }) {
            Ok(()) => scheduled += 1,
            Err(e) => tracing::warn!(job, error = %e, "offloaded job rejected"),
        }
    }
    tracing::info!(scheduled, "offload batch submitted");
    metrics::record_request("offload", 202);
    (
        StatusCode::ACCEPTED,
        Json(json!({ "scheduled": scheduled, "traceId": context::trace_id() })),
    )
}

/// Call the backend's `/user` through the injecting client.
async fn relay(State(state): State<FrontendState>) -> Response {
    match state.client.get("backend", "/user").await {
        Ok(body) => {
            tracing::info!("relay succeeded");
            metrics::record_request("relay", 200);
            Json(json!({
                "upstream": as_json(body),
                "traceId": context::trace_id(),
            }))
            .into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "relay to backend failed");
            metrics::record_request("relay", 502);
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({
                    "error": e.to_string(),
                    "traceId": context::trace_id(),
                })),
            )
                .into_response()
        }
    }
}

/// Same call, but substitute an explicit fallback body on failure.
async fn relay_fallback(State(state): State<FrontendState>) -> impl IntoResponse {
    let body = state
        .client
        .get("backend", "/user")
        .await
        .or_fallback(|_| "backend unavailable, fallback response engaged".to_string());
    metrics::record_request("relay-fallback", 200);
    Json(json!({
        "upstream": as_json(body),
        "traceId": context::trace_id(),
    }))
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// Upstream bodies are usually JSON; carry them through verbatim when not.
fn as_json(body: String) -> Value {
    serde_json::from_str(&body).unwrap_or(Value::String(body))
}
