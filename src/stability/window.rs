// StabilityWindow - "how long has the rounded value been constant"
//
// Invariant: `stable_since_ms` is Some only while `last_value` has not
// changed since the timestamp was recorded.

use serde::{Deserialize, Serialize};

use super::RoundedAngle;

/// What a single observation did to the window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// Value differs from the previous one (or is the first); timer cleared
    Changed,
    /// Same value seen again; timer started now
    HoldingStarted,
    /// Same value, timer already running
    Holding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StabilityWindow {
    last_value: Option<RoundedAngle>,
    stable_since_ms: Option<u64>,
}

impl StabilityWindow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, value: RoundedAngle, now_ms: u64) -> Observation {
        if self.last_value != Some(value) {
            self.last_value = Some(value);
            self.stable_since_ms = None;
            return Observation::Changed;
        }

        if self.stable_since_ms.is_none() {
            self.stable_since_ms = Some(now_ms);
            return Observation::HoldingStarted;
        }

        Observation::Holding
    }

    /// Milliseconds the value has been held at `now_ms`, if holding
    pub fn held_for(&self, now_ms: u64) -> Option<u64> {
        self.stable_since_ms
            .map(|since| now_ms.saturating_sub(since))
    }

    pub fn last_value(&self) -> Option<RoundedAngle> {
        self.last_value
    }

    pub fn stable_since_ms(&self) -> Option<u64> {
        self.stable_since_ms
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn angle(degrees: f64) -> RoundedAngle {
        RoundedAngle::from_degrees(degrees)
    }

    #[test]
    fn test_first_observation_is_a_change() {
        let mut window = StabilityWindow::new();
        assert_eq!(window.observe(angle(10.0), 0), Observation::Changed);
        assert_eq!(window.stable_since_ms(), None);
        assert_eq!(window.last_value(), Some(angle(10.0)));
    }

    #[test]
    fn test_repeat_starts_then_continues_hold() {
        let mut window = StabilityWindow::new();
        window.observe(angle(10.0), 0);
        assert_eq!(window.observe(angle(10.0), 500), Observation::HoldingStarted);
        assert_eq!(window.observe(angle(10.0), 1000), Observation::Holding);
        assert_eq!(window.stable_since_ms(), Some(500));
        assert_eq!(window.held_for(1800), Some(1300));
    }

    #[test]
    fn test_change_clears_timer() {
        let mut window = StabilityWindow::new();
        window.observe(angle(10.0), 0);
        window.observe(angle(10.0), 500);
        assert_eq!(window.observe(angle(10.1), 1000), Observation::Changed);
        assert_eq!(window.stable_since_ms(), None);
        assert_eq!(window.held_for(5000), None);
    }

    #[test]
    fn test_reset() {
        let mut window = StabilityWindow::new();
        window.observe(angle(1.0), 0);
        window.observe(angle(1.0), 10);
        window.reset();
        assert_eq!(window, StabilityWindow::default());
    }
}
