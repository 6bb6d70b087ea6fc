use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::instrument;

use super::CLOUDHAND_STATUS_HEADER;
use super::error::GatewayError;
use super::state::TriggerState;
use crate::replication::{CopyRequest, StorageObjectEvent};

#[derive(Debug, Serialize)]
pub struct EventResponse {
    pub status: &'static str,
    pub source: String,
    pub destination: String,
}

/// Parses the request body into a storage event.
///
/// Both binary-mode (object resource as body) and structured-mode CloudEvents
/// are accepted.
pub fn parse_event(body: &[u8]) -> Result<StorageObjectEvent, GatewayError> {
    let payload: serde_json::Value = serde_json::from_slice(body)
        .map_err(|e| GatewayError::InvalidRequest(format!("body is not JSON: {e}")))?;

    Ok(StorageObjectEvent::from_payload(payload)?)
}

#[instrument(skip(state, headers, body), fields(ce_id = tracing::field::Empty))]
pub async fn storage_event_handler(
    State(state): State<TriggerState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, GatewayError> {
    if let Some(id) = headers.get("ce-id").and_then(|v| v.to_str().ok()) {
        tracing::Span::current().record("ce_id", id);
    }

    let event = parse_event(&body)?;
    let request = CopyRequest::for_event(&event, state.trigger.destination());
    tracing::debug!(source = %request.source, "Received storage event");

    let outcome = state.trigger.handle(&event).await?;

    let mut response_headers = HeaderMap::new();
    response_headers.insert(
        CLOUDHAND_STATUS_HEADER,
        HeaderValue::from_static(outcome.as_str()),
    );

    Ok((
        StatusCode::OK,
        response_headers,
        Json(EventResponse {
            status: outcome.as_str(),
            source: request.source.to_string(),
            destination: request.destination.to_string(),
        }),
    )
        .into_response())
}
