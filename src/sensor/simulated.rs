//! Simulated hand-held sensor: a device being brought to rest on a surface.
//!
//! Each reading is the target angle plus an exponentially decaying approach
//! error plus uniform jitter. With jitter well under the display resolution
//! the rounded value settles and the session can lock.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use super::{RawReading, SampleSubscription, SensorSource};
use crate::error::SessionError;

/// Parameters of the simulated motion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationProfile {
    pub target_pitch: f64,
    pub target_roll: f64,
    /// Offset from the target at t=0, in degrees
    pub initial_error: f64,
    /// Time constant of the approach, in milliseconds
    pub settle_ms: f64,
    /// Peak uniform noise, in degrees
    pub jitter: f64,
    pub rate_hz: f64,
    /// Fixed seed for reproducible runs
    pub seed: Option<u64>,
}

impl Default for SimulationProfile {
    fn default() -> Self {
        Self {
            target_pitch: 30.0,
            target_roll: 0.0,
            initial_error: 8.0,
            settle_ms: 400.0,
            jitter: 0.02,
            rate_hz: 30.0,
            seed: None,
        }
    }
}

impl SimulationProfile {
    /// Angles at `elapsed_ms` for a given noise draw in [-1, 1].
    pub fn angles_at(&self, elapsed_ms: f64, noise: (f64, f64)) -> (f64, f64) {
        let decay = if self.settle_ms > 0.0 {
            (-elapsed_ms / self.settle_ms).exp()
        } else {
            0.0
        };
        let approach = self.initial_error * decay;
        (
            self.target_pitch + approach + noise.0 * self.jitter,
            self.target_roll + approach * 0.5 + noise.1 * self.jitter,
        )
    }

    fn period(&self) -> Option<Duration> {
        if self.rate_hz.is_finite() && self.rate_hz > 0.0 {
            Some(Duration::from_secs_f64(1.0 / self.rate_hz))
        } else {
            None
        }
    }
}

/// Endless noisy feed following a [`SimulationProfile`].
#[derive(Debug, Clone, Default)]
pub struct SimulatedSensor {
    profile: SimulationProfile,
}

impl SimulatedSensor {
    pub fn new(profile: SimulationProfile) -> Self {
        Self { profile }
    }

    pub fn profile(&self) -> &SimulationProfile {
        &self.profile
    }
}

impl SensorSource for SimulatedSensor {
    fn subscribe(&self) -> Result<SampleSubscription, SessionError> {
        let period = self
            .profile
            .period()
            .ok_or_else(|| SessionError::SensorSubscriptionFailed {
                reason: format!("invalid simulation rate {} Hz", self.profile.rate_hz),
            })?;

        let profile = self.profile.clone();
        let (tx, rx) = mpsc::channel(64);

        let producer = tokio::spawn(async move {
            let mut rng = match profile.seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let start = tokio::time::Instant::now();

            loop {
                ticker.tick().await;
                let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
                let noise = (rng.gen_range(-1.0..=1.0), rng.gen_range(-1.0..=1.0));
                let (pitch, roll) = profile.angles_at(elapsed_ms, noise);
                if tx.send(RawReading::new(pitch, roll)).await.is_err() {
                    break;
                }
            }
        });

        log::debug!(
            "[SimulatedSensor] Subscribed at {:.1} Hz towards pitch {:.1}°",
            self.profile.rate_hz,
            self.profile.target_pitch
        );
        Ok(SampleSubscription::from_queue(rx, producer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_angles_converge_to_target() {
        let profile = SimulationProfile {
            target_pitch: 20.0,
            target_roll: -3.0,
            ..SimulationProfile::default()
        };

        let (pitch, roll) = profile.angles_at(0.0, (0.0, 0.0));
        assert_eq!(pitch, 28.0);
        assert_eq!(roll, 1.0);

        let (pitch, roll) = profile.angles_at(10_000.0, (0.0, 0.0));
        assert!((pitch - 20.0).abs() < 1e-6);
        assert!((roll + 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_jitter_is_bounded() {
        let profile = SimulationProfile {
            jitter: 0.5,
            initial_error: 0.0,
            ..SimulationProfile::default()
        };
        let (pitch, _) = profile.angles_at(0.0, (1.0, -1.0));
        assert!((pitch - 30.5).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_rate_rejected() {
        let sensor = SimulatedSensor::new(SimulationProfile {
            rate_hz: 0.0,
            ..SimulationProfile::default()
        });
        assert!(sensor.subscribe().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_seeded_feed_settles() {
        let sensor = SimulatedSensor::new(SimulationProfile {
            seed: Some(7),
            ..SimulationProfile::default()
        });
        let mut sub = sensor.subscribe().unwrap();

        let mut last = None;
        for _ in 0..120 {
            last = sub.recv().await;
        }
        let pitch = last.and_then(|r| r.pitch).unwrap();
        assert!((pitch - 30.0).abs() < 0.05, "pitch {}", pitch);
    }
}
