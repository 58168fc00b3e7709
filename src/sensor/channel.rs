//! Externally pushed sensor feed.
//!
//! The host (a platform event loop, stdin reader, test) pushes readings into a
//! `SensorFeed`; every live subscription receives them. Subscriptions hold a
//! broadcast receiver directly, so dropping one unsubscribes immediately.

use tokio::sync::broadcast;

use super::{RawReading, SampleSubscription, SensorSource};
use crate::error::SessionError;

/// Feed capacity; a slow subscriber skips the oldest readings past this.
const FEED_CAPACITY: usize = 256;

/// Sensor whose readings are pushed in from outside.
#[derive(Clone)]
pub struct ChannelSensor {
    tx: broadcast::Sender<RawReading>,
}

/// Push side of a [`ChannelSensor`].
#[derive(Clone)]
pub struct SensorFeed {
    tx: broadcast::Sender<RawReading>,
}

impl ChannelSensor {
    pub fn new() -> (Self, SensorFeed) {
        let (tx, _) = broadcast::channel(FEED_CAPACITY);
        (Self { tx: tx.clone() }, SensorFeed { tx })
    }

    /// Number of subscriptions currently listening.
    pub fn active_subscriptions(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl SensorSource for ChannelSensor {
    fn subscribe(&self) -> Result<SampleSubscription, SessionError> {
        Ok(SampleSubscription::from_feed(self.tx.subscribe()))
    }
}

impl SensorFeed {
    /// Push a reading; returns how many subscriptions received it.
    pub fn push(&self, reading: RawReading) -> usize {
        self.tx.send(reading).unwrap_or(0)
    }

    pub fn has_listeners(&self) -> bool {
        self.tx.receiver_count() > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_push_reaches_subscriber() {
        let (sensor, feed) = ChannelSensor::new();
        let mut sub = sensor.subscribe().unwrap();

        assert_eq!(feed.push(RawReading::new(4.0, 1.0)), 1);
        assert_eq!(sub.recv().await, Some(RawReading::new(4.0, 1.0)));
    }

    #[test]
    fn test_push_without_listeners_is_dropped() {
        let (_sensor, feed) = ChannelSensor::new();
        assert!(!feed.has_listeners());
        assert_eq!(feed.push(RawReading::new(1.0, 1.0)), 0);
    }

    #[test]
    fn test_drop_unsubscribes() {
        let (sensor, _feed) = ChannelSensor::new();
        let first = sensor.subscribe().unwrap();
        let second = sensor.subscribe().unwrap();
        assert_eq!(sensor.active_subscriptions(), 2);

        drop(first);
        assert_eq!(sensor.active_subscriptions(), 1);
        drop(second);
        assert_eq!(sensor.active_subscriptions(), 0);
    }
}
