//! Per-driver index of live subscribers.
//!
//! The registry holds the delivery half of each subscription: the bounded
//! sender feeding the subscriber's stream and the cursor recording the
//! newest timestamp delivered so far. The receiving half is owned by the
//! [`Subscription`](crate::subscription::Subscription) the transport holds,
//! so registry membership never keeps a connection alive.

use std::collections::HashMap;

use locus_types::{DriverId, LocationRecord, SubscriberId, Timestamp};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// Newest timestamp a subscriber has been given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cursor {
    /// Nothing delivered yet; every timestamp is newer.
    Origin,
    /// The last delivered (or requested) watermark.
    At(Timestamp),
}

impl Cursor {
    /// Whether a record stamped `timestamp` is newer than this cursor.
    pub fn admits(&self, timestamp: &Timestamp) -> bool {
        match self {
            Self::Origin => true,
            Self::At(current) => timestamp.is_after(current),
        }
    }

    /// The watermark, if any.
    pub const fn timestamp(&self) -> Option<&Timestamp> {
        match self {
            Self::Origin => None,
            Self::At(ts) => Some(ts),
        }
    }
}

/// Result of offering one record to one subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Written to the sink; cursor advanced.
    Delivered,
    /// Not newer than the cursor; skipped.
    Stale,
    /// The bounded buffer is full; nothing written, cursor unchanged.
    Full,
    /// The receiving side is gone.
    Closed,
}

/// Registry entry for one live subscription.
#[derive(Debug)]
pub struct Subscriber {
    id: SubscriberId,
    sink: mpsc::Sender<LocationRecord>,
    cursor: Cursor,
}

impl Subscriber {
    /// Pair a sink with its starting cursor.
    pub const fn new(id: SubscriberId, sink: mpsc::Sender<LocationRecord>, cursor: Cursor) -> Self {
        Self { id, sink, cursor }
    }

    /// The subscription handle.
    pub const fn id(&self) -> SubscriberId {
        self.id
    }

    /// Current cursor.
    pub const fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    /// Deliver `record` if it is newer than the cursor.
    ///
    /// Never blocks: the sink is written with `try_send`.
    pub fn offer(&mut self, record: &LocationRecord) -> Delivery {
        if !self.cursor.admits(&record.timestamp) {
            return Delivery::Stale;
        }
        match self.sink.try_send(record.clone()) {
            Ok(()) => {
                self.cursor = Cursor::At(record.timestamp.clone());
                Delivery::Delivered
            }
            Err(TrySendError::Full(_)) => Delivery::Full,
            Err(TrySendError::Closed(_)) => Delivery::Closed,
        }
    }
}

/// Map from driver to the subscribers currently streaming it.
///
/// A driver key is present only while it has at least one subscriber.
#[derive(Debug, Default)]
pub struct SubscriberRegistry {
    by_driver: HashMap<DriverId, HashMap<SubscriberId, Subscriber>>,
}

impl SubscriberRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a subscriber under `driver_id`.
    pub fn register(&mut self, driver_id: DriverId, subscriber: Subscriber) {
        self.by_driver
            .entry(driver_id)
            .or_default()
            .insert(subscriber.id, subscriber);
    }

    /// Remove a subscriber, dropping the driver key once its set is empty.
    ///
    /// Returns the removed entry, or `None` if it was already gone.
    pub fn unregister(
        &mut self,
        driver_id: &DriverId,
        subscriber_id: &SubscriberId,
    ) -> Option<Subscriber> {
        let set = self.by_driver.get_mut(driver_id)?;
        let removed = set.remove(subscriber_id);
        if set.is_empty() {
            self.by_driver.remove(driver_id);
        }
        removed
    }

    /// Subscribers of one driver (possibly none).
    pub fn subscribers_of(&self, driver_id: &DriverId) -> impl Iterator<Item = &Subscriber> {
        self.by_driver
            .get(driver_id)
            .into_iter()
            .flat_map(HashMap::values)
    }

    /// Mutable access for cursor advancement during fan-out.
    pub fn subscribers_of_mut(
        &mut self,
        driver_id: &DriverId,
    ) -> impl Iterator<Item = &mut Subscriber> {
        self.by_driver
            .get_mut(driver_id)
            .into_iter()
            .flat_map(HashMap::values_mut)
    }

    /// Whether a subscriber is registered under `driver_id`.
    pub fn contains(&self, driver_id: &DriverId, subscriber_id: &SubscriberId) -> bool {
        self.by_driver
            .get(driver_id)
            .is_some_and(|set| set.contains_key(subscriber_id))
    }

    /// Drivers with at least one subscriber.
    pub fn driver_count(&self) -> usize {
        self.by_driver.len()
    }

    /// Subscribers across all drivers.
    pub fn subscriber_count(&self) -> usize {
        self.by_driver.values().map(HashMap::len).sum()
    }

    /// Remove every subscriber, closing all sinks. Returns how many there were.
    pub fn clear(&mut self) -> usize {
        let count = self.subscriber_count();
        self.by_driver.clear();
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> Timestamp {
        Timestamp::parse(s).unwrap_or_else(|e| unreachable!("{e}"))
    }

    fn subscriber(cursor: Cursor) -> (Subscriber, mpsc::Receiver<LocationRecord>) {
        let (tx, rx) = mpsc::channel(4);
        (Subscriber::new(SubscriberId::new(), tx, cursor), rx)
    }

    #[test]
    fn origin_admits_everything() {
        assert!(Cursor::Origin.admits(&ts("1900-01-01T00:00:00Z")));
        assert!(Cursor::Origin.timestamp().is_none());
    }

    #[test]
    fn cursor_admits_only_strictly_newer() {
        let cursor = Cursor::At(ts("2024-01-01T00:00:02Z"));
        assert!(!cursor.admits(&ts("2024-01-01T00:00:01Z")));
        assert!(!cursor.admits(&ts("2024-01-01T00:00:02Z")));
        assert!(!cursor.admits(&ts("2024-01-01T02:00:02+02:00")));
        assert!(cursor.admits(&ts("2024-01-01T00:00:03Z")));
    }

    #[test]
    fn offer_advances_cursor_and_skips_duplicates() {
        let (mut sub, mut rx) = subscriber(Cursor::Origin);
        let r1 = LocationRecord::new("d1", 1.0, 1.0, ts("2024-01-01T00:00:01Z"));
        let r2 = LocationRecord::new("d1", 2.0, 2.0, ts("2024-01-01T00:00:02Z"));
        let r3 = r2.clone();

        assert_eq!(sub.offer(&r1), Delivery::Delivered);
        assert_eq!(sub.offer(&r2), Delivery::Delivered);
        assert_eq!(sub.offer(&r3), Delivery::Stale);
        assert_eq!(sub.cursor(), &Cursor::At(ts("2024-01-01T00:00:02Z")));

        assert_eq!(rx.try_recv().ok(), Some(r1));
        assert_eq!(rx.try_recv().ok(), Some(r2));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn offer_reports_full_and_closed_without_advancing() {
        let (tx, rx) = mpsc::channel(1);
        let mut sub = Subscriber::new(SubscriberId::new(), tx, Cursor::Origin);
        let r1 = LocationRecord::new("d1", 1.0, 1.0, ts("2024-01-01T00:00:01Z"));
        let r2 = LocationRecord::new("d1", 1.0, 1.0, ts("2024-01-01T00:00:02Z"));

        assert_eq!(sub.offer(&r1), Delivery::Delivered);
        assert_eq!(sub.offer(&r2), Delivery::Full);
        assert_eq!(sub.cursor(), &Cursor::At(ts("2024-01-01T00:00:01Z")));

        drop(rx);
        assert_eq!(sub.offer(&r2), Delivery::Closed);
    }

    #[test]
    fn unregister_removes_empty_driver_key_and_is_idempotent() {
        let mut registry = SubscriberRegistry::new();
        let driver = DriverId::from("d1");
        let (a, _rx_a) = subscriber(Cursor::Origin);
        let (b, _rx_b) = subscriber(Cursor::Origin);
        let (a_id, b_id) = (a.id(), b.id());

        registry.register(driver.clone(), a);
        registry.register(driver.clone(), b);
        assert_eq!(registry.subscribers_of(&driver).count(), 2);

        assert!(registry.unregister(&driver, &a_id).is_some());
        assert_eq!(registry.driver_count(), 1);
        assert!(registry.unregister(&driver, &a_id).is_none());

        assert!(registry.unregister(&driver, &b_id).is_some());
        assert_eq!(registry.driver_count(), 0);
        assert_eq!(registry.subscribers_of(&driver).count(), 0);
        assert!(registry.unregister(&driver, &b_id).is_none());
    }

    #[test]
    fn unregister_closes_the_sink() {
        let mut registry = SubscriberRegistry::new();
        let driver = DriverId::from("d1");
        let (sub, mut rx) = subscriber(Cursor::Origin);
        let id = sub.id();
        registry.register(driver.clone(), sub);

        drop(registry.unregister(&driver, &id));
        assert!(matches!(
            rx.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        ));
    }

    #[test]
    fn clear_counts_and_empties() {
        let mut registry = SubscriberRegistry::new();
        let (a, _rx_a) = subscriber(Cursor::Origin);
        let (b, _rx_b) = subscriber(Cursor::Origin);
        registry.register(DriverId::from("a"), a);
        registry.register(DriverId::from("b"), b);
        assert_eq!(registry.subscriber_count(), 2);
        assert_eq!(registry.clear(), 2);
        assert_eq!(registry.driver_count(), 0);
    }
}
