//! Axum router construction.
//!
//! Assembles all routes into a single [`Router`] with CORS enabled so
//! browser dashboards on other origins can open streams.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::sse;
use crate::state::AppState;

/// Build the complete Axum router.
///
/// The router includes:
/// - `GET /stream/{driver_id}` -- Server-Sent Events location stream
/// - `POST /event` -- submit a location update
/// - `GET /health` -- relay counters
///
/// CORS allows any origin, matching the `Access-Control-Allow-Origin: *`
/// that stream consumers rely on.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Streaming
        .route("/stream/{driver_id}", get(sse::stream_driver))
        // Ingest
        .route("/event", post(handlers::submit_event))
        // Status
        .route("/health", get(handlers::health))
        .fallback(handlers::not_found)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
