// OffsetCalibrator - zero-reference handling for orientation samples
//
// Zeroing makes the current orientation the new (0, 0). While measuring the
// latest raw sample is adopted immediately; before the first sample arrives
// the calibrator arms itself and adopts the next sample instead.

use serde::{Deserialize, Serialize};

use crate::sensor::AngleSample;

/// Reference subtracted from every raw sample
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CalibrationOffset {
    pub pitch_offset: f64,
    pub roll_offset: f64,
}

/// Pitch/roll after the offset has been removed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdjustedAngles {
    pub pitch: f64,
    pub roll: f64,
}

/// OffsetCalibrator owns the offset and the "zero on next sample" flag
#[derive(Debug, Clone, Default)]
pub struct OffsetCalibrator {
    offset: CalibrationOffset,
    zero_on_next_sample: bool,
}

impl OffsetCalibrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the zero reference
    ///
    /// # Arguments
    /// * `current` - Latest raw sample when measuring, `None` otherwise
    pub fn zero(&mut self, current: Option<&AngleSample>) {
        match current {
            Some(sample) => {
                self.offset = CalibrationOffset {
                    pitch_offset: sample.pitch,
                    roll_offset: sample.roll,
                };
                self.zero_on_next_sample = false;
                log::info!(
                    "[OffsetCalibrator] Zeroed at pitch {:.2}°, roll {:.2}°",
                    sample.pitch,
                    sample.roll
                );
            }
            None => {
                self.zero_on_next_sample = true;
                log::info!("[OffsetCalibrator] Zero armed for next sample");
            }
        }
    }

    /// Remove the offset from a raw sample
    ///
    /// An armed zero adopts this sample as the reference first, so the
    /// returned angles are exactly zero.
    pub fn apply(&mut self, sample: &AngleSample) -> AdjustedAngles {
        if self.zero_on_next_sample {
            self.zero(Some(sample));
        }

        AdjustedAngles {
            pitch: sample.pitch - self.offset.pitch_offset,
            roll: sample.roll - self.offset.roll_offset,
        }
    }

    /// Cancel a pending zero without touching the stored offset
    pub fn disarm(&mut self) {
        self.zero_on_next_sample = false;
    }

    /// Back to {0, 0}, disarmed
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn offset(&self) -> CalibrationOffset {
        self.offset
    }

    pub fn is_armed(&self) -> bool {
        self.zero_on_next_sample
    }
}
