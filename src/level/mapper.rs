// BubbleMapper - tilt to 2-D bubble offset
//
// Roll moves the bubble horizontally, pitch vertically, so the screen reads
// like a surface level lying flat on the roof.

use serde::{Deserialize, Serialize};

use crate::config::BubbleConfig;
use crate::units::round_half_up;

/// Where to draw the bubble, relative to the center
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BubblePosition {
    pub offset_x: f64,
    pub offset_y: f64,
    pub is_level: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BubbleMapper {
    multiplier: f64,
    max_offset: f64,
}

impl BubbleMapper {
    pub fn new(multiplier: f64, max_offset: f64) -> Self {
        Self {
            multiplier,
            max_offset: max_offset.abs(),
        }
    }

    pub fn from_config(config: &BubbleConfig) -> Self {
        Self::new(config.multiplier, config.max_offset)
    }

    /// Map adjusted pitch/roll in degrees
    pub fn map(&self, pitch: f64, roll: f64) -> BubblePosition {
        BubblePosition {
            offset_x: self.scale(roll),
            offset_y: self.scale(pitch),
            is_level: round_half_up(pitch) == 0.0 && round_half_up(roll) == 0.0,
        }
    }

    fn scale(&self, degrees: f64) -> f64 {
        let scaled = degrees * self.multiplier;
        if scaled.is_nan() {
            0.0
        } else {
            scaled.clamp(-self.max_offset, self.max_offset)
        }
    }
}

impl Default for BubbleMapper {
    fn default() -> Self {
        Self::new(5.0, 100.0)
    }
}
