//! Location records and the inbound update envelope.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::RecordError;
use crate::ids::DriverId;
use crate::timestamp::Timestamp;

/// A single position report for one driver.
///
/// Immutable once accepted. Serialized on the stream exactly as
/// `{driver_id, latitude, longitude, timestamp}`, with the timestamp
/// echoed in the producer's original text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct LocationRecord {
    /// The driver this position belongs to.
    pub driver_id: DriverId,
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
    /// When the position was observed.
    #[ts(as = "String")]
    pub timestamp: Timestamp,
}

impl LocationRecord {
    /// Build a record.
    pub fn new(
        driver_id: impl Into<DriverId>,
        latitude: f64,
        longitude: f64,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            driver_id: driver_id.into(),
            latitude,
            longitude,
            timestamp,
        }
    }

    /// Reject records the relay must never see: an empty driver
    /// identifier or a non-finite coordinate.
    ///
    /// Timestamp validity is already enforced by [`Timestamp`] parsing.
    pub fn validate(&self) -> Result<(), RecordError> {
        if self.driver_id.is_empty() {
            return Err(RecordError::EmptyDriverId);
        }
        if !self.latitude.is_finite() {
            return Err(RecordError::NonFiniteCoordinate { field: "latitude" });
        }
        if !self.longitude.is_finite() {
            return Err(RecordError::NonFiniteCoordinate { field: "longitude" });
        }
        Ok(())
    }
}

/// Body of an inbound update: `{ "event": "...", "data": { ... } }`.
///
/// The `event` label is informational (producers typically send
/// `"location_update"`); only `data` is relayed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct LocationEvent {
    /// Producer-supplied event label.
    #[serde(default)]
    #[ts(optional)]
    pub event: Option<String>,
    /// The position report.
    pub data: LocationRecord,
}
