//! Append-only per-driver location history.
//!
//! Records are kept in arrival order and never truncated. Queries compare
//! timestamps as instants (see [`Timestamp`]), never as strings.

use std::collections::HashMap;

use locus_types::{DriverId, LocationRecord, Timestamp};

/// In-memory history of every accepted location record, keyed by driver.
///
/// Not synchronized on its own; the relay owns it behind its state lock.
#[derive(Debug, Default)]
pub struct HistoryStore {
    records: HashMap<DriverId, Vec<LocationRecord>>,
    total: usize,
}

impl HistoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record to the end of its driver's sequence.
    ///
    /// No ordering check is made: an out-of-order record is stored where it
    /// arrived.
    pub fn append(&mut self, record: LocationRecord) {
        self.records
            .entry(record.driver_id.clone())
            .or_default()
            .push(record);
        self.total = self.total.saturating_add(1);
    }

    /// The most recently appended record for a driver.
    pub fn latest(&self, driver_id: &DriverId) -> Option<&LocationRecord> {
        self.records.get(driver_id).and_then(|seq| seq.last())
    }

    /// Every record for a driver whose timestamp is strictly later than
    /// `since`, in arrival order. Unknown drivers yield nothing.
    pub fn after<'a>(
        &'a self,
        driver_id: &DriverId,
        since: &'a Timestamp,
    ) -> impl Iterator<Item = &'a LocationRecord> + use<'a> {
        self.records
            .get(driver_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .filter(move |record| record.timestamp.is_after(since))
    }

    /// Number of records held for one driver.
    pub fn len_of(&self, driver_id: &DriverId) -> usize {
        self.records.get(driver_id).map_or(0, Vec::len)
    }

    /// Number of drivers with at least one record.
    pub fn driver_count(&self) -> usize {
        self.records.len()
    }

    /// Total records across all drivers.
    pub const fn record_count(&self) -> usize {
        self.total
    }
}
