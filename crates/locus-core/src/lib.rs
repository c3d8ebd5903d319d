//! Subscription and fan-out engine for the Locus location relay.
//!
//! Producers push position updates for named drivers; consumers open
//! long-lived streams for one driver, optionally resuming from a past
//! timestamp. This crate holds everything with real design content:
//!
//! - [`history`] -- append-only per-driver record history
//! - [`registry`] -- per-driver set of live subscribers and their cursors
//! - [`relay`] -- [`LocationRelay`], the fan-out engine and stream
//!   lifecycle manager that owns both of the above
//! - [`subscription`] -- [`Subscription`], the stream handle given to the
//!   transport layer
//! - [`config`] -- typed `locus-config.yaml` structures
//!
//! # Delivery guarantee
//!
//! Each subscriber carries a cursor: the newest timestamp it has been
//! given. An update reaches a subscriber only if its timestamp is strictly
//! newer than that cursor, so every subscriber sees a strictly increasing,
//! duplicate-free sequence regardless of where its replay started.

pub mod config;
pub mod history;
pub mod registry;
pub mod relay;
pub mod subscription;

// Re-export primary types for convenience.
pub use config::{ConfigError, LocusConfig, OverflowPolicy, RelayConfig};
pub use relay::{LocationRelay, RelayStats, SubmitReceipt};
pub use subscription::Subscription;
