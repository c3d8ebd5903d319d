//! Background startup helper.
//!
//! Provides [`spawn_server`] which binds eagerly, then runs the server on
//! a background Tokio task. Binding before spawning means an unusable
//! address is reported to the caller instead of being logged from a task
//! nobody awaits.
//!
//! # Usage
//!
//! ```rust,ignore
//! use locus_api::{spawn_server, AppState, ServerConfig};
//! use std::sync::Arc;
//!
//! let state = Arc::new(AppState::default());
//! let (addr, handle) = spawn_server(&ServerConfig::default(), state, shutdown).await?;
//! ```

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::server::{ServerConfig, ServerError};
use crate::state::AppState;

/// Errors that can occur when spawning the server.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// The server failed to bind or start.
    #[error("server start error: {0}")]
    Server(#[from] ServerError),
}

/// Bind and spawn the HTTP server on a background Tokio task.
///
/// Returns the bound address (useful with port `0`) and the task handle.
/// The task ends after `shutdown` resolves and open connections drain.
pub async fn spawn_server<F>(
    config: &ServerConfig,
    state: Arc<AppState>,
    shutdown: F,
) -> Result<(SocketAddr, JoinHandle<()>), StartupError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = crate::server::bind(config).await?;
    let addr = listener
        .local_addr()
        .map_err(|e| ServerError::Bind(format!("local address unavailable: {e}")))?;

    let handle = tokio::spawn(async move {
        if let Err(e) = crate::server::serve(listener, state, shutdown).await {
            tracing::error!(error = %e, "Locus server exited with error");
        }
    });

    tracing::info!(%addr, "Locus server spawned on background task");

    Ok((addr, handle))
}
