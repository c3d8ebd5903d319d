//! Locus relay binary.
//!
//! Wires configuration, logging, the in-memory relay, and the HTTP server
//! together, then serves until `Ctrl-C` or `SIGTERM`.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `locus-config.yaml` (or `LOCUS_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Create the relay and shared application state
//! 4. Serve until a shutdown signal, then close all live streams

mod error;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use locus_api::{AppState, ServerConfig};
use locus_core::LocusConfig;
use locus_core::config::{LogFormat, LoggingConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::ServerBinError;

/// Config file read when `LOCUS_CONFIG` is unset.
const DEFAULT_CONFIG_PATH: &str = "locus-config.yaml";

/// Application entry point.
#[tokio::main]
async fn main() -> Result<(), ServerBinError> {
    // 1. Load configuration. Logging is not up yet, so remember where the
    //    config came from and report it after step 2.
    let config_path = config_path();
    let (config, loaded_from_file) = load_config(&config_path)?;

    // 2. Initialize structured logging.
    init_logging(&config.logging)?;
    info!("locus-server starting");
    if loaded_from_file {
        info!(path = %config_path.display(), "Configuration loaded");
    } else {
        info!(path = %config_path.display(), "Config file not found, using defaults");
    }
    info!(
        host = config.server.host,
        port = config.server.port,
        subscriber_buffer = config.relay.subscriber_buffer,
        overflow = ?config.relay.overflow,
        keep_alive_secs = config.stream.keep_alive_secs,
        "Relay configuration"
    );

    // 3. Create the relay.
    let state = Arc::new(AppState::new(config.relay.clone(), &config.stream));

    // 4. Serve.
    let server_config = ServerConfig::from(&config.server);
    locus_api::start_server(&server_config, state, shutdown_signal()).await?;

    info!("locus-server shutdown complete");
    Ok(())
}

/// `LOCUS_CONFIG` if set, else `locus-config.yaml` in the working directory.
fn config_path() -> PathBuf {
    std::env::var_os("LOCUS_CONFIG").map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from)
}

/// Load the config file if it exists, otherwise defaults (still subject to
/// environment overrides).
fn load_config(path: &Path) -> Result<(LocusConfig, bool), ServerBinError> {
    if path.exists() {
        Ok((LocusConfig::from_file(path)?, true))
    } else {
        Ok((LocusConfig::parse("")?, false))
    }
}

/// `RUST_LOG` wins; otherwise the configured level.
fn build_filter(logging: &LoggingConfig) -> Result<EnvFilter, ServerBinError> {
    EnvFilter::try_from_default_env().or_else(|_| {
        EnvFilter::try_new(&logging.level).map_err(|e| ServerBinError::Logging {
            message: format!("invalid level {:?}: {e}", logging.level),
        })
    })
}

fn init_logging(logging: &LoggingConfig) -> Result<(), ServerBinError> {
    let filter = build_filter(logging)?;
    match logging.format {
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init(),
    }
    Ok(())
}

/// Resolve on `Ctrl-C` or, on Unix, `SIGTERM`.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Ctrl-C handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let result = load_config(Path::new("does-not-exist/locus-config.yaml"));
        assert!(matches!(result, Ok((_, false))));
    }

    #[test]
    fn configured_level_builds_a_filter() {
        let logging = LoggingConfig {
            level: String::from("locus_core=debug,info"),
            format: LogFormat::Text,
        };
        assert!(build_filter(&logging).is_ok());
    }
}
