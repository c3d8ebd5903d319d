//! The transport-facing handle of one live stream.

use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::Weak;
use std::task::{Context, Poll};

use futures::Stream;
use locus_types::{DriverId, LocationRecord, SubscriberId};
use tokio::sync::mpsc;

use crate::relay::LocationRelay;

/// A live subscription to one driver's locations.
///
/// Yields the catch-up replay computed at open time, then every live
/// update the fan-out engine delivers. The stream ends once the relay
/// unregisters the subscriber (overflow, relay shutdown, or an explicit
/// [`LocationRelay::close_stream`]) and the already-buffered records have
/// been drained.
///
/// Dropping the handle is the disconnect signal: it deregisters the
/// subscriber immediately, independent of any further updates.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriberId,
    driver_id: DriverId,
    replay: VecDeque<LocationRecord>,
    live: mpsc::Receiver<LocationRecord>,
    relay: Weak<LocationRelay>,
}

impl Subscription {
    pub(crate) const fn new(
        id: SubscriberId,
        driver_id: DriverId,
        replay: VecDeque<LocationRecord>,
        live: mpsc::Receiver<LocationRecord>,
        relay: Weak<LocationRelay>,
    ) -> Self {
        Self {
            id,
            driver_id,
            replay,
            live,
            relay,
        }
    }

    /// The subscriber handle registered with the relay.
    pub const fn id(&self) -> SubscriberId {
        self.id
    }

    /// The driver this subscription follows.
    pub const fn driver_id(&self) -> &DriverId {
        &self.driver_id
    }

    /// Replay records not yet consumed.
    pub fn pending_replay(&self) -> usize {
        self.replay.len()
    }

    /// Wait for the next record; `None` once the subscription has ended.
    pub async fn next_record(&mut self) -> Option<LocationRecord> {
        if let Some(record) = self.replay.pop_front() {
            return Some(record);
        }
        self.live.recv().await
    }

    /// Take the next record if one is ready, without waiting.
    pub fn try_next_record(&mut self) -> Option<LocationRecord> {
        self.replay
            .pop_front()
            .or_else(|| self.live.try_recv().ok())
    }

    /// Close the stream and deregister now.
    pub fn close(self) {
        drop(self);
    }
}

impl Stream for Subscription {
    type Item = LocationRecord;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if let Some(record) = this.replay.pop_front() {
            return Poll::Ready(Some(record));
        }
        this.live.poll_recv(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(relay) = self.relay.upgrade() {
            relay.close_stream(&self.driver_id, &self.id);
        }
    }
}
