//! Orientation sensor abstractions.
//!
//! A `SensorSource` hands out a `SampleSubscription`: an owned handle over a
//! push feed of raw readings. Dropping the handle unsubscribes and aborts any
//! producer task, so a session that lets go of its subscription can never be
//! reached by stale readings afterwards.

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use crate::error::SessionError;

pub mod channel;
pub mod permission;
pub mod scripted;
pub mod simulated;

pub use channel::{ChannelSensor, SensorFeed};
pub use permission::{FixedPermission, NoAuthorization, PermissionGate, PermissionOutcome};
pub use scripted::{ScriptEnd, ScriptedSensor};
pub use simulated::{SimulatedSensor, SimulationProfile};

/// One push from the sensor: pitch (beta) and roll (gamma) in degrees.
///
/// `None` means the platform delivered an event without orientation data.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RawReading {
    pub pitch: Option<f64>,
    pub roll: Option<f64>,
}

impl RawReading {
    pub fn new(pitch: f64, roll: f64) -> Self {
        Self {
            pitch: Some(pitch),
            roll: Some(roll),
        }
    }

    pub fn pitch_only(pitch: f64) -> Self {
        Self {
            pitch: Some(pitch),
            roll: None,
        }
    }

    pub fn unavailable() -> Self {
        Self::default()
    }

    /// Stamp the reading. Missing roll counts as flat; missing pitch means no sample.
    pub fn into_sample(self, timestamp_ms: u64) -> Option<AngleSample> {
        let pitch = self.pitch?;
        Some(AngleSample {
            pitch,
            roll: self.roll.unwrap_or(0.0),
            timestamp_ms,
        })
    }

    /// Parse one line of a readings script: `"<pitch> [roll]"` or `"null"`.
    pub fn parse_line(line: &str) -> Option<Result<Self, String>> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }
        if line.eq_ignore_ascii_case("null") {
            return Some(Ok(Self::unavailable()));
        }

        let mut parts = line.split(|c: char| c.is_whitespace() || c == ',');
        let parse = |part: Option<&str>| -> Result<Option<f64>, String> {
            match part.map(str::trim).filter(|p| !p.is_empty()) {
                None => Ok(None),
                Some(p) if p.eq_ignore_ascii_case("null") => Ok(None),
                Some(p) => p
                    .parse::<f64>()
                    .map(Some)
                    .map_err(|err| format!("invalid angle '{}': {}", p, err)),
            }
        };

        let pitch = match parse(parts.next()) {
            Ok(value) => value,
            Err(err) => return Some(Err(err)),
        };
        let roll = match parse(parts.find(|p| !p.trim().is_empty())) {
            Ok(value) => value,
            Err(err) => return Some(Err(err)),
        };
        Some(Ok(Self { pitch, roll }))
    }
}

/// A reading stamped with the session clock on arrival.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AngleSample {
    pub pitch: f64,
    pub roll: f64,
    pub timestamp_ms: u64,
}

/// Source of orientation readings.
pub trait SensorSource: Send + Sync {
    /// Open a new subscription to the feed.
    fn subscribe(&self) -> Result<SampleSubscription, SessionError>;
}

enum SubscriptionInner {
    Queue(mpsc::Receiver<RawReading>),
    Feed(broadcast::Receiver<RawReading>),
}

/// Owned handle over an active sensor feed.
pub struct SampleSubscription {
    inner: SubscriptionInner,
    producer: Option<JoinHandle<()>>,
}

impl SampleSubscription {
    /// Subscription fed by a dedicated producer task.
    pub fn from_queue(rx: mpsc::Receiver<RawReading>, producer: JoinHandle<()>) -> Self {
        Self {
            inner: SubscriptionInner::Queue(rx),
            producer: Some(producer),
        }
    }

    /// Subscription on a shared push feed.
    pub fn from_feed(rx: broadcast::Receiver<RawReading>) -> Self {
        Self {
            inner: SubscriptionInner::Feed(rx),
            producer: None,
        }
    }

    /// Next reading, or `None` once the feed has closed.
    pub async fn recv(&mut self) -> Option<RawReading> {
        match &mut self.inner {
            SubscriptionInner::Queue(rx) => rx.recv().await,
            SubscriptionInner::Feed(rx) => loop {
                match rx.recv().await {
                    Ok(reading) => return Some(reading),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        log::debug!("[SampleSubscription] Skipped {} stale readings", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            },
        }
    }
}

impl Drop for SampleSubscription {
    fn drop(&mut self) {
        if let Some(producer) = self.producer.take() {
            producer.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_sample_requires_pitch() {
        assert!(RawReading::unavailable().into_sample(10).is_none());

        let sample = RawReading::pitch_only(12.5).into_sample(10).unwrap();
        assert_eq!(sample.pitch, 12.5);
        assert_eq!(sample.roll, 0.0);
        assert_eq!(sample.timestamp_ms, 10);
    }

    #[test]
    fn test_parse_line_variants() {
        assert_eq!(
            RawReading::parse_line("10.5 -2"),
            Some(Ok(RawReading::new(10.5, -2.0)))
        );
        assert_eq!(
            RawReading::parse_line("10.5,-2"),
            Some(Ok(RawReading::new(10.5, -2.0)))
        );
        assert_eq!(
            RawReading::parse_line("7"),
            Some(Ok(RawReading::pitch_only(7.0)))
        );
        assert_eq!(
            RawReading::parse_line("null"),
            Some(Ok(RawReading::unavailable()))
        );
        assert_eq!(RawReading::parse_line("   "), None);
        assert_eq!(RawReading::parse_line("# comment"), None);
        assert!(matches!(RawReading::parse_line("abc"), Some(Err(_))));
    }

    #[tokio::test]
    async fn test_dropping_queue_subscription_aborts_producer() {
        let (tx, rx) = mpsc::channel(4);
        let producer = tokio::spawn(async move {
            loop {
                if tx.send(RawReading::new(1.0, 0.0)).await.is_err() {
                    break;
                }
                tokio::task::yield_now().await;
            }
        });
        let abort_probe = producer.abort_handle();

        let mut sub = SampleSubscription::from_queue(rx, producer);
        assert!(sub.recv().await.is_some());
        drop(sub);

        for _ in 0..16 {
            if abort_probe.is_finished() {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert!(abort_probe.is_finished());
    }
}
