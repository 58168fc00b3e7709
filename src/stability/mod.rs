//! Stability detection for rounded angle readings.
//!
//! Samples arrive fast and noisy; each one is rounded and fed to
//! [`StabilityDetector::observe`]. Whether the value has settled is judged
//! separately, on the session's poll cadence, via
//! [`StabilityDetector::is_stable`].

use std::fmt;

use serde::{Deserialize, Serialize};

pub mod window;

pub use window::{Observation, StabilityWindow};

/// Default hold time before a value is accepted.
pub const DEFAULT_THRESHOLD_MS: u64 = 3000;

/// Angle rounded to one decimal, stored as tenths so equality is exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoundedAngle {
    tenths: i64,
}

impl RoundedAngle {
    /// Round half-up to the nearest tenth of a degree.
    pub fn from_degrees(degrees: f64) -> Self {
        Self {
            tenths: (degrees * 10.0 + 0.5).floor() as i64,
        }
    }

    pub fn tenths(&self) -> i64 {
        self.tenths
    }

    pub fn degrees(&self) -> f64 {
        self.tenths as f64 / 10.0
    }
}

impl fmt::Display for RoundedAngle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.tenths < 0 { "-" } else { "" };
        let abs = self.tenths.unsigned_abs();
        write!(f, "{}{}.{}", sign, abs / 10, abs % 10)
    }
}

/// Window plus threshold.
#[derive(Debug, Clone)]
pub struct StabilityDetector {
    window: StabilityWindow,
    threshold_ms: u64,
}

impl StabilityDetector {
    pub fn new(threshold_ms: u64) -> Self {
        Self {
            window: StabilityWindow::new(),
            threshold_ms,
        }
    }

    pub fn observe(&mut self, value: RoundedAngle, now_ms: u64) -> Observation {
        self.window.observe(value, now_ms)
    }

    /// True once the current value has been held for at least the threshold.
    pub fn is_stable(&self, now_ms: u64) -> bool {
        self.window
            .held_for(now_ms)
            .is_some_and(|held| held >= self.threshold_ms)
    }

    pub fn is_holding(&self) -> bool {
        self.window.stable_since_ms().is_some()
    }

    pub fn window(&self) -> &StabilityWindow {
        &self.window
    }

    pub fn threshold_ms(&self) -> u64 {
        self.threshold_ms
    }

    pub fn reset(&mut self) {
        self.window.reset();
    }
}

impl Default for StabilityDetector {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD_MS)
    }
}
