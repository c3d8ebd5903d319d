//! Server-Sent Events handler for live driver locations.
//!
//! Clients connect to `GET /stream/{driver_id}` (optionally with
//! `?since=<ISO-8601>`) and receive one `data: <json>` event per
//! [`LocationRecord`](locus_types::LocationRecord): first the catch-up
//! replay, then live updates as producers submit them.
//!
//! Disconnect detection is structural: when the client goes away, Axum
//! drops the response body, which drops the
//! [`Subscription`](locus_core::Subscription) inside it, which deregisters
//! the subscriber from the relay.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::{Stream, StreamExt};
use locus_types::{DriverId, Timestamp};
use serde::Deserialize;
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;

/// Query parameters for `GET /stream/{driver_id}`.
#[derive(Debug, Deserialize)]
pub struct StreamQuery {
    /// Resume point: replay everything strictly after this instant.
    /// Absent means "latest position only".
    pub since: Option<String>,
}

/// Open a live location stream for one driver.
///
/// # Route
///
/// `GET /stream/{driver_id}`
pub async fn stream_driver(
    State(state): State<Arc<AppState>>,
    Path(driver_id): Path<String>,
    Query(query): Query<StreamQuery>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, ApiError> {
    let driver_id = DriverId::from(driver_id);
    if driver_id.is_empty() {
        return Err(ApiError::InvalidQuery(String::from(
            "driver_id must not be empty",
        )));
    }

    let since = query
        .since
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(Timestamp::parse)
        .transpose()?;

    let subscription = state.relay.open_stream(driver_id, since);
    debug!(
        subscriber = %subscription.id(),
        replay = subscription.pending_replay(),
        "Stream response started"
    );

    let events = subscription.map(|record| Event::default().json_data(&record));

    Ok(Sse::new(events).keep_alive(KeepAlive::new().interval(state.keep_alive)))
}
