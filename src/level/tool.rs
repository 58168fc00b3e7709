// LevelingTool - live bubble level with zero, unit switch and level tone
//
// Readings are only processed between start and stop. Each processed reading
// yields a readout with both display values, the bubble position and the
// level edge; entering level plays the tone once.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::mapper::{BubbleMapper, BubblePosition};
use super::tracker::{LevelEdge, LevelTracker};
use crate::audio::ToneCue;
use crate::calibration::{AdjustedAngles, CalibrationOffset, OffsetCalibrator};
use crate::sensor::{AngleSample, RawReading};
use crate::units::{DisplayReading, DisplayUnit, UnitConverter};

/// Everything the level screen shows for one reading
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelReadout {
    pub pitch: DisplayReading,
    pub roll: DisplayReading,
    pub adjusted: AdjustedAngles,
    pub bubble: BubblePosition,
    pub edge: LevelEdge,
}

/// What a zero request did
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ZeroOutcome {
    /// Latest sample became the reference
    Applied { offset: CalibrationOffset },
    /// Next sample will become the reference; displays read zero meanwhile
    Armed {
        pitch: DisplayReading,
        roll: DisplayReading,
    },
}

pub struct LevelingTool {
    calibrator: OffsetCalibrator,
    converter: UnitConverter,
    mapper: BubbleMapper,
    tracker: LevelTracker,
    cue: Arc<dyn ToneCue>,
    unit: DisplayUnit,
    measuring: bool,
    last_sample: Option<AngleSample>,
    readings: u64,
}

impl LevelingTool {
    pub fn new(
        converter: UnitConverter,
        mapper: BubbleMapper,
        unit: DisplayUnit,
        cue: Arc<dyn ToneCue>,
    ) -> Self {
        Self {
            calibrator: OffsetCalibrator::new(),
            converter,
            mapper,
            tracker: LevelTracker::new(),
            cue,
            unit,
            measuring: false,
            last_sample: None,
            readings: 0,
        }
    }

    pub fn start(&mut self) {
        log::info!("[LevelingTool] Started ({:?})", self.unit);
        self.measuring = true;
    }

    /// Stop processing readings; a pending zero is dropped
    pub fn stop(&mut self) {
        log::info!("[LevelingTool] Stopped after {} readings", self.readings);
        self.measuring = false;
        self.calibrator.disarm();
    }

    pub fn is_measuring(&self) -> bool {
        self.measuring
    }

    pub fn zero(&mut self) -> ZeroOutcome {
        let current = if self.measuring {
            self.last_sample.as_ref()
        } else {
            None
        };
        self.calibrator.zero(current);

        if self.calibrator.is_armed() {
            ZeroOutcome::Armed {
                pitch: DisplayReading::zero(self.unit),
                roll: DisplayReading::zero(self.unit),
            }
        } else {
            ZeroOutcome::Applied {
                offset: self.calibrator.offset(),
            }
        }
    }

    pub fn set_unit(&mut self, unit: DisplayUnit) {
        self.unit = unit;
    }

    pub fn unit(&self) -> DisplayUnit {
        self.unit
    }

    /// Flip the level tone and return the new state
    pub fn toggle_audio(&self) -> bool {
        self.cue.toggle()
    }

    pub fn offset(&self) -> CalibrationOffset {
        self.calibrator.offset()
    }

    pub fn handle_reading(&mut self, reading: RawReading) -> Option<LevelReadout> {
        if !self.measuring {
            return None;
        }

        self.readings += 1;
        let Some(sample) = reading.into_sample(self.readings) else {
            log::debug!("[LevelingTool] Reading without orientation data ignored");
            return None;
        };
        self.last_sample = Some(sample);

        let adjusted = self.calibrator.apply(&sample);
        let bubble = self.mapper.map(adjusted.pitch, adjusted.roll);
        let edge = self.tracker.update(bubble.is_level);
        if edge == LevelEdge::Entered {
            self.cue.play();
        }

        Some(LevelReadout {
            pitch: self.converter.format(adjusted.pitch, self.unit),
            roll: self.converter.format(adjusted.roll, self.unit),
            adjusted,
            bubble,
            edge,
        })
    }
}
