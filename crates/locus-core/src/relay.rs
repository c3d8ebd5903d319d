//! The location relay service: fan-out engine and subscription lifecycle.
//!
//! [`LocationRelay`] is the single owner of the [`HistoryStore`] and the
//! [`SubscriberRegistry`]. Both live behind one lock, so appends,
//! registrations, deregistrations, and cursor advancement are serialized
//! with each other. Nothing awaits while the lock is held: sinks are
//! written with `try_send`, so a slow consumer costs at most one failed
//! write per update.

use std::collections::VecDeque;
use std::sync::Arc;

use locus_types::{DriverId, LocationRecord, SubscriberId, Timestamp};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::{OverflowPolicy, RelayConfig};
use crate::history::HistoryStore;
use crate::registry::{Cursor, Delivery, Subscriber, SubscriberRegistry};
use crate::subscription::Subscription;

/// Outcome of one accepted update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SubmitReceipt {
    /// Subscribers the record was written to.
    pub delivered: usize,
    /// Subscribers already at or past the record's timestamp.
    pub skipped: usize,
    /// Subscribers whose full buffer dropped this record.
    pub dropped: usize,
    /// Subscribers removed because their sink was full or gone.
    pub disconnected: usize,
}

/// Point-in-time counters for health reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RelayStats {
    /// Drivers with recorded history.
    pub drivers: usize,
    /// Records held across all drivers.
    pub records: usize,
    /// Drivers with at least one live subscriber.
    pub streamed_drivers: usize,
    /// Live subscribers across all drivers.
    pub subscribers: usize,
}

#[derive(Debug, Default)]
struct RelayState {
    history: HistoryStore,
    registry: SubscriberRegistry,
    shut_down: bool,
}

/// In-memory relay of driver locations to streaming subscribers.
///
/// Created once at startup and shared as `Arc<LocationRelay>`.
#[derive(Debug)]
pub struct LocationRelay {
    state: Mutex<RelayState>,
    config: RelayConfig,
}

impl LocationRelay {
    /// Create an empty relay.
    pub fn new(config: RelayConfig) -> Self {
        Self {
            state: Mutex::new(RelayState::default()),
            config,
        }
    }

    /// The active configuration.
    pub const fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Accept a location update: append it to history, then deliver it to
    /// every current subscriber of its driver whose cursor is older.
    ///
    /// Always succeeds. Sinks that are gone, or full under
    /// [`OverflowPolicy::Disconnect`], are deregistered as if their stream
    /// had closed.
    pub fn submit_update(&self, record: LocationRecord) -> SubmitReceipt {
        let mut receipt = SubmitReceipt::default();
        let mut evicted: Vec<SubscriberId> = Vec::new();

        let mut state = self.state.lock();
        let RelayState {
            history, registry, ..
        } = &mut *state;

        history.append(record.clone());

        for subscriber in registry.subscribers_of_mut(&record.driver_id) {
            match subscriber.offer(&record) {
                Delivery::Delivered => {
                    receipt.delivered = receipt.delivered.saturating_add(1);
                }
                Delivery::Stale => {
                    debug!(
                        driver_id = %record.driver_id,
                        subscriber = %subscriber.id(),
                        timestamp = %record.timestamp,
                        "Skipped update, subscriber already has this timestamp"
                    );
                    receipt.skipped = receipt.skipped.saturating_add(1);
                }
                Delivery::Full => match self.config.overflow {
                    OverflowPolicy::Disconnect => {
                        warn!(
                            driver_id = %record.driver_id,
                            subscriber = %subscriber.id(),
                            buffer = self.config.subscriber_buffer,
                            "Subscriber buffer full, disconnecting"
                        );
                        evicted.push(subscriber.id());
                    }
                    OverflowPolicy::DropNewest => {
                        warn!(
                            driver_id = %record.driver_id,
                            subscriber = %subscriber.id(),
                            timestamp = %record.timestamp,
                            "Subscriber buffer full, dropping update"
                        );
                        receipt.dropped = receipt.dropped.saturating_add(1);
                    }
                },
                Delivery::Closed => {
                    debug!(
                        driver_id = %record.driver_id,
                        subscriber = %subscriber.id(),
                        "Subscriber sink closed, deregistering"
                    );
                    evicted.push(subscriber.id());
                }
            }
        }

        for id in &evicted {
            if registry.unregister(&record.driver_id, id).is_some() {
                receipt.disconnected = receipt.disconnected.saturating_add(1);
            }
        }
        drop(state);

        debug!(
            driver_id = %record.driver_id,
            timestamp = %record.timestamp,
            delivered = receipt.delivered,
            skipped = receipt.skipped,
            disconnected = receipt.disconnected,
            "Location update accepted"
        );

        receipt
    }

    /// Open a stream for `driver_id`.
    ///
    /// With `since`, the replay is every stored record strictly newer than
    /// `since` and the cursor starts at the last replayed timestamp (or at
    /// `since` when nothing qualifies). Without it, the replay is the
    /// latest record alone, if any, and an unknown driver starts from the
    /// origin so its first update is always delivered.
    ///
    /// The replay is computed and the subscriber registered atomically, so
    /// every update accepted afterwards is either in the replay or
    /// delivered live, never both.
    pub fn open_stream(
        self: &Arc<Self>,
        driver_id: DriverId,
        since: Option<Timestamp>,
    ) -> Subscription {
        let id = SubscriberId::new();
        let (sink, live) = mpsc::channel(self.config.subscriber_buffer.max(1));

        let mut state = self.state.lock();
        let (replay, cursor) = match &since {
            Some(watermark) => {
                let replay: VecDeque<LocationRecord> = state
                    .history
                    .after(&driver_id, watermark)
                    .cloned()
                    .collect();
                let cursor = replay.back().map_or_else(
                    || Cursor::At(watermark.clone()),
                    |last| Cursor::At(last.timestamp.clone()),
                );
                (replay, cursor)
            }
            None => state.history.latest(&driver_id).map_or_else(
                || (VecDeque::new(), Cursor::Origin),
                |latest| {
                    (
                        VecDeque::from([latest.clone()]),
                        Cursor::At(latest.timestamp.clone()),
                    )
                },
            ),
        };

        let registered = !state.shut_down;
        if registered {
            state
                .registry
                .register(driver_id.clone(), Subscriber::new(id, sink, cursor));
        } else {
            // The sink drops here, so the stream ends after the replay.
            drop(sink);
        }
        drop(state);

        if registered {
            info!(
                driver_id = %driver_id,
                subscriber = %id,
                since = since.as_ref().map_or("latest", Timestamp::as_str),
                replay = replay.len(),
                "New subscriber"
            );
        } else {
            warn!(driver_id = %driver_id, "Stream opened after shutdown, replay only");
        }

        Subscription::new(id, driver_id, replay, live, Arc::downgrade(self))
    }

    /// Deregister a subscriber and close its sink.
    ///
    /// Idempotent; returns whether the subscriber was still registered.
    pub fn close_stream(&self, driver_id: &DriverId, subscriber_id: &SubscriberId) -> bool {
        let removed = self.state.lock().registry.unregister(driver_id, subscriber_id);
        let was_registered = removed.is_some();
        drop(removed);
        if was_registered {
            info!(driver_id = %driver_id, subscriber = %subscriber_id, "Subscriber disconnected");
        }
        was_registered
    }

    /// The most recent record for a driver.
    pub fn latest(&self, driver_id: &DriverId) -> Option<LocationRecord> {
        self.state.lock().history.latest(driver_id).cloned()
    }

    /// Stored records for a driver strictly newer than `since`.
    pub fn history_after(&self, driver_id: &DriverId, since: &Timestamp) -> Vec<LocationRecord> {
        self.state
            .lock()
            .history
            .after(driver_id, since)
            .cloned()
            .collect()
    }

    /// Whether a subscriber is currently registered.
    pub fn is_subscribed(&self, driver_id: &DriverId, subscriber_id: &SubscriberId) -> bool {
        self.state.lock().registry.contains(driver_id, subscriber_id)
    }

    /// Live counters.
    pub fn stats(&self) -> RelayStats {
        let state = self.state.lock();
        RelayStats {
            drivers: state.history.driver_count(),
            records: state.history.record_count(),
            streamed_drivers: state.registry.driver_count(),
            subscribers: state.registry.subscriber_count(),
        }
    }

    /// End every live stream and refuse new registrations.
    ///
    /// History is kept, so streams opened afterwards still get their
    /// replay before ending. Returns the number of streams closed.
    pub fn shutdown(&self) -> usize {
        let mut state = self.state.lock();
        state.shut_down = true;
        let closed = state.registry.clear();
        drop(state);
        info!(closed, "Relay shut down, all streams closed");
        closed
    }
}

impl Default for LocationRelay {
    fn default() -> Self {
        Self::new(RelayConfig::default())
    }
}
