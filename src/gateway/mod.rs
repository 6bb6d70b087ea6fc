//! HTTP host (Axum) that feeds storage notifications into the replication trigger.
//!
//! This module is primarily used by the `cloudhand-copy` binary.

pub mod error;
pub mod handler;
pub mod state;

#[cfg(test)]
mod handler_tests;

use axum::{
    Json, Router,
    http::{HeaderMap, StatusCode, header::HeaderValue},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

pub use error::GatewayError;
pub use handler::storage_event_handler;
pub use state::TriggerState;

/// Response header carrying the outcome of a request.
pub const CLOUDHAND_STATUS_HEADER: &str = "x-cloudhand-status";

pub fn create_router_with_state(state: TriggerState) -> Router {
    Router::new()
        .route("/", post(storage_event_handler))
        .route("/healthz", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(serde::Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[tracing::instrument]
pub async fn health_handler() -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(CLOUDHAND_STATUS_HEADER, HeaderValue::from_static("healthy"));

    (
        StatusCode::OK,
        headers,
        Json(HealthResponse { status: "ok" }),
    )
        .into_response()
}
