//! Backend demo service: the downstream half of the relay pair.

use std::time::Duration;

use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::http::extract::TraceScopeLayer;
use crate::observability::metrics;
use crate::trace::context;

/// Build the backend router with all middleware layers.
pub fn router(request_timeout: Duration) -> Router {
    Router::new()
        .route("/user", get(user))
        .route("/health", get(health))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceScopeLayer)
        .layer(TraceLayer::new_for_http())
}

/// Return a user document stamped with the trace id this request ran under.
async fn user() -> impl IntoResponse {
    tracing::info!("user request received");
    metrics::record_request("user", 200);
    Json(json!({
        "id": 1,
        "name": "demo-user",
        "servedBy": "backend",
        "traceId": context::trace_id(),
    }))
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}
