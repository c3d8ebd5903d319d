//! Error types for the relay binary.
//!
//! [`ServerBinError`] is the top-level error type that wraps every
//! failure mode during startup and serving.

/// Top-level error for the relay binary.
#[derive(Debug, thiserror::Error)]
pub enum ServerBinError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: locus_core::ConfigError,
    },

    /// The log filter could not be parsed.
    #[error("logging error: {message}")]
    Logging {
        /// Description of the logging failure.
        message: String,
    },

    /// The HTTP server failed to bind or serve.
    #[error("server error: {source}")]
    Server {
        /// The underlying server error.
        #[from]
        source: locus_api::ServerError,
    },
}
