//! HTTP transport for the Locus location relay.
//!
//! This crate provides an Axum server that exposes:
//!
//! - **Server-Sent Events** (`GET /stream/{driver_id}`) for live driver
//!   locations, with `?since=` catch-up replay
//! - **Ingest** (`POST /event`) for producers pushing position updates
//! - **Health** (`GET /health`) with relay counters
//!
//! # Architecture
//!
//! All state lives in a single [`LocationRelay`](locus_core::LocationRelay)
//! shared through [`AppState`]. Handlers validate input, then call the
//! relay; the relay never blocks on a slow client because each stream is
//! fed through its own bounded buffer.

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod sse;
pub mod startup;
pub mod state;

// Re-export primary types for convenience.
pub use error::ApiError;
pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use startup::{StartupError, spawn_server};
pub use state::AppState;
