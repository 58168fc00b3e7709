//! Sensor that replays a fixed list of readings at a fixed cadence.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use super::{RawReading, SampleSubscription, SensorSource};
use crate::error::SessionError;

/// What the feed does once the script is exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptEnd {
    /// Keep the feed open without further readings.
    Hold,
    /// Keep re-sending the last reading at the same cadence.
    RepeatLast,
    /// Close the feed.
    Close,
}

/// Replays readings, the first one immediately, then one per `interval`.
#[derive(Clone)]
pub struct ScriptedSensor {
    readings: Arc<Vec<RawReading>>,
    interval: Duration,
    end: ScriptEnd,
    subscriptions: Arc<AtomicUsize>,
}

impl ScriptedSensor {
    pub fn new(readings: Vec<RawReading>, interval: Duration) -> Self {
        Self {
            readings: Arc::new(readings),
            interval,
            end: ScriptEnd::Hold,
            subscriptions: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_end(mut self, end: ScriptEnd) -> Self {
        self.end = end;
        self
    }

    /// Script of pitch-only readings.
    pub fn from_pitches(pitches: &[f64], interval: Duration) -> Self {
        Self::new(
            pitches.iter().copied().map(RawReading::pitch_only).collect(),
            interval,
        )
    }

    /// Total number of subscriptions opened so far.
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.load(Ordering::SeqCst)
    }
}

impl SensorSource for ScriptedSensor {
    fn subscribe(&self) -> Result<SampleSubscription, SessionError> {
        if self.interval.is_zero() {
            return Err(SessionError::SensorSubscriptionFailed {
                reason: "script interval must be non-zero".to_string(),
            });
        }

        self.subscriptions.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::channel(32);
        let readings = Arc::clone(&self.readings);
        let period = self.interval;
        let end = self.end;

        let producer = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            for reading in readings.iter() {
                ticker.tick().await;
                if tx.send(*reading).await.is_err() {
                    return;
                }
            }

            match (end, readings.last()) {
                (ScriptEnd::RepeatLast, Some(last)) => loop {
                    ticker.tick().await;
                    if tx.send(*last).await.is_err() {
                        return;
                    }
                },
                (ScriptEnd::Close, _) => {}
                _ => tx.closed().await,
            }
        });

        Ok(SampleSubscription::from_queue(rx, producer))
    }
}
