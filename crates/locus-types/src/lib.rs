//! Shared type definitions for the Locus location relay.
//!
//! This crate is the single source of truth for the records that flow
//! between producers, the relay core, and streaming consumers. Wire types
//! are exported to `TypeScript` via `ts-rs` for dashboard clients.
//!
//! # Modules
//!
//! - [`ids`] -- Driver and subscriber identifiers
//! - [`timestamp`] -- ISO-8601 timestamps compared as instants
//! - [`location`] -- Location records and the inbound update envelope
//! - [`error`] -- Parse and validation errors

pub mod error;
pub mod ids;
pub mod location;
pub mod timestamp;

// Re-export all public types at crate root for convenience.
pub use error::{RecordError, TimestampError};
pub use ids::{DriverId, SubscriberId};
pub use location::{LocationEvent, LocationRecord};
pub use timestamp::Timestamp;
