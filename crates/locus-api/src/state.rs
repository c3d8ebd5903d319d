//! Shared application state for the HTTP server.

use std::sync::Arc;
use std::time::Duration;

use locus_core::config::StreamConfig;
use locus_core::{LocationRelay, RelayConfig};

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor. The relay
/// is the process-wide owner of history and subscribers; handlers only
/// call into it.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The relay every handler submits to and streams from.
    pub relay: Arc<LocationRelay>,
    /// Interval between keep-alive comments on idle streams.
    pub keep_alive: Duration,
}

impl AppState {
    /// Create state around a fresh relay.
    pub fn new(relay: RelayConfig, stream: &StreamConfig) -> Self {
        Self::with_relay(Arc::new(LocationRelay::new(relay)), stream)
    }

    /// Create state around an existing relay.
    pub const fn with_relay(relay: Arc<LocationRelay>, stream: &StreamConfig) -> Self {
        Self {
            relay,
            keep_alive: Duration::from_secs(stream.keep_alive_secs),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(RelayConfig::default(), &StreamConfig::default())
    }
}
