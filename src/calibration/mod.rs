// Calibration module - zero-reference offset for orientation samples
//
// A single zero-offset is the only calibration supported: the user holds the
// device on a reference surface and zeroes it. Everything downstream (unit
// conversion, stability detection, bubble mapping) consumes adjusted angles.

pub mod offset;

pub use offset::{AdjustedAngles, CalibrationOffset, OffsetCalibrator};
