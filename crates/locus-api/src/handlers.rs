//! REST endpoint handlers.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/event` | Submit a driver location update |
//! | `GET` | `/health` | Relay counters |
//!
//! The streaming endpoint lives in [`crate::sse`].

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::Uri;
use chrono::{SecondsFormat, Utc};
use locus_core::RelayStats;
use locus_types::LocationEvent;
use serde::Serialize;
use tracing::info;

use crate::error::ApiError;
use crate::state::AppState;

/// Acknowledgement returned for every accepted update.
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    /// Always `true`; rejected updates get an error body instead.
    pub success: bool,
    /// Human-readable acknowledgement.
    pub message: &'static str,
    /// Server receipt time, RFC 3339.
    pub timestamp: String,
}

/// Body of `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `"ok"` while the server is answering.
    pub status: &'static str,
    /// Relay counters.
    #[serde(flatten)]
    pub stats: RelayStats,
}

// ---------------------------------------------------------------------------
// POST /event -- submit update
// ---------------------------------------------------------------------------

/// Accept a location update and fan it out to the driver's subscribers.
///
/// The body is `{ "event": "...", "data": { driver_id, latitude,
/// longitude, timestamp } }`. Malformed bodies, an empty `driver_id`,
/// non-finite coordinates, and unparsable timestamps are rejected with
/// `400` before anything reaches the relay.
pub async fn submit_event(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LocationEvent>, JsonRejection>,
) -> Result<Json<SubmitResponse>, ApiError> {
    let Json(LocationEvent { event, data }) =
        payload.map_err(|rejection| ApiError::InvalidPayload(rejection.body_text()))?;
    data.validate()?;

    info!(
        driver_id = %data.driver_id,
        event = event.as_deref().unwrap_or("-"),
        latitude = data.latitude,
        longitude = data.longitude,
        timestamp = %data.timestamp,
        "Received driver location update"
    );

    state.relay.submit_update(data);

    Ok(Json(SubmitResponse {
        success: true,
        message: "Location data received",
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    }))
}

// ---------------------------------------------------------------------------
// GET /health
// ---------------------------------------------------------------------------

/// Report liveness and relay counters.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        stats: state.relay.stats(),
    })
}

/// JSON 404 for unmatched routes.
pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(uri.path().to_owned())
}
