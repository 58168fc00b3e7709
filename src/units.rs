//! Angle-to-display conversion.
//!
//! Converts an adjusted angle in degrees into the integer shown to the user,
//! either as whole degrees or as percent grade (rise over run × 100). Percent
//! grade is unbounded at ±90°, so values saturate at a configurable limit
//! instead of leaking huge or non-finite numbers into the display.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Largest percent-grade magnitude shown before saturating.
pub const DEFAULT_PERCENT_GRADE_LIMIT: i64 = 9999;

/// Unit used for display formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayUnit {
    #[default]
    Degrees,
    PercentGrade,
}

impl DisplayUnit {
    pub fn symbol(&self) -> &'static str {
        match self {
            DisplayUnit::Degrees => "°",
            DisplayUnit::PercentGrade => "%",
        }
    }
}

impl std::str::FromStr for DisplayUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "degrees" | "deg" => Ok(DisplayUnit::Degrees),
            "percent" | "percent_grade" | "grade" => Ok(DisplayUnit::PercentGrade),
            other => Err(format!("unknown unit '{}' (expected degrees or percent)", other)),
        }
    }
}

/// A formatted reading ready for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayReading {
    pub value: i64,
    pub unit: DisplayUnit,
    /// Set when the value was clamped to the percent-grade limit
    pub saturated: bool,
}

impl DisplayReading {
    /// Reading shown right after zeroing.
    pub fn zero(unit: DisplayUnit) -> Self {
        Self {
            value: 0,
            unit,
            saturated: false,
        }
    }

    pub fn symbol(&self) -> &'static str {
        self.unit.symbol()
    }
}

impl fmt::Display for DisplayReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.unit.symbol())
    }
}

/// Round half-up to the nearest integer (`-0.5` rounds to `0`).
pub fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// Converter carrying the percent-grade saturation limit.
#[derive(Debug, Clone, Copy)]
pub struct UnitConverter {
    percent_grade_limit: i64,
}

impl UnitConverter {
    pub fn new(percent_grade_limit: i64) -> Self {
        Self {
            percent_grade_limit: percent_grade_limit.max(0),
        }
    }

    /// Format an adjusted angle (degrees) in the requested unit.
    pub fn format(&self, angle_degrees: f64, unit: DisplayUnit) -> DisplayReading {
        match unit {
            DisplayUnit::Degrees => self.format_degrees(angle_degrees),
            DisplayUnit::PercentGrade => self.format_percent_grade(angle_degrees),
        }
    }

    fn format_degrees(&self, angle: f64) -> DisplayReading {
        if !angle.is_finite() {
            return self.non_finite(angle, DisplayUnit::Degrees);
        }
        DisplayReading {
            value: round_half_up(angle) as i64,
            unit: DisplayUnit::Degrees,
            saturated: false,
        }
    }

    fn format_percent_grade(&self, angle: f64) -> DisplayReading {
        if !angle.is_finite() {
            return self.non_finite(angle, DisplayUnit::PercentGrade);
        }
        if angle.abs() >= 90.0 {
            return self.saturate(angle.signum());
        }

        let grade = round_half_up(angle.to_radians().tan() * 100.0);
        if !grade.is_finite() || grade.abs() > self.percent_grade_limit as f64 {
            return self.saturate(angle.signum());
        }

        DisplayReading {
            value: grade as i64,
            unit: DisplayUnit::PercentGrade,
            saturated: false,
        }
    }

    fn saturate(&self, sign: f64) -> DisplayReading {
        let value = if sign < 0.0 {
            -self.percent_grade_limit
        } else {
            self.percent_grade_limit
        };
        DisplayReading {
            value,
            unit: DisplayUnit::PercentGrade,
            saturated: true,
        }
    }

    fn non_finite(&self, angle: f64, unit: DisplayUnit) -> DisplayReading {
        if angle.is_nan() {
            return DisplayReading {
                value: 0,
                unit,
                saturated: true,
            };
        }
        let mut reading = self.saturate(angle.signum());
        reading.unit = unit;
        reading
    }
}

impl Default for UnitConverter {
    fn default() -> Self {
        Self::new(DEFAULT_PERCENT_GRADE_LIMIT)
    }
}

/// Format with the default saturation limit.
pub fn format(angle_degrees: f64, unit: DisplayUnit) -> DisplayReading {
    UnitConverter::default().format(angle_degrees, unit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degrees_rounds_to_nearest() {
        assert_eq!(format(10.4, DisplayUnit::Degrees).value, 10);
        assert_eq!(format(10.5, DisplayUnit::Degrees).value, 11);
        assert_eq!(format(-3.6, DisplayUnit::Degrees).value, -4);
        assert_eq!(format(-0.5, DisplayUnit::Degrees).value, 0);
    }

    #[test]
    fn test_degrees_symbol() {
        let reading = format(12.0, DisplayUnit::Degrees);
        assert_eq!(reading.symbol(), "°");
        assert_eq!(reading.to_string(), "12°");
    }

    #[test]
    fn test_degrees_render_parses_back() {
        for angle in [-179.6, -45.2, -0.4, 0.0, 7.5, 33.3, 89.9, 180.0] {
            let reading = format(angle, DisplayUnit::Degrees);
            let rendered = reading.to_string();
            let parsed: i64 = rendered.trim_end_matches('°').parse().unwrap();
            assert_eq!(parsed, reading.value, "angle {}", angle);
        }
    }

    #[test]
    fn test_percent_grade_forty_five_degrees() {
        let reading = format(45.0, DisplayUnit::PercentGrade);
        assert_eq!(reading.value, 100);
        assert_eq!(reading.symbol(), "%");
        assert!(!reading.saturated);
    }

    #[test]
    fn test_percent_grade_small_angles() {
        assert_eq!(format(0.0, DisplayUnit::PercentGrade).value, 0);
        // tan(10°) = 0.1763
        assert_eq!(format(10.0, DisplayUnit::PercentGrade).value, 18);
        assert_eq!(format(-10.0, DisplayUnit::PercentGrade).value, -18);
    }

    #[test]
    fn test_percent_grade_saturates_near_vertical() {
        let reading = format(89.999, DisplayUnit::PercentGrade);
        assert!(reading.saturated);
        assert_eq!(reading.value, DEFAULT_PERCENT_GRADE_LIMIT);

        let reading = format(-90.0, DisplayUnit::PercentGrade);
        assert!(reading.saturated);
        assert_eq!(reading.value, -DEFAULT_PERCENT_GRADE_LIMIT);

        let reading = format(135.0, DisplayUnit::PercentGrade);
        assert!(reading.saturated);
        assert_eq!(reading.value, DEFAULT_PERCENT_GRADE_LIMIT);
    }

    #[test]
    fn test_custom_limit() {
        let converter = UnitConverter::new(500);
        // tan(80°) * 100 = 567
        let reading = converter.format(80.0, DisplayUnit::PercentGrade);
        assert!(reading.saturated);
        assert_eq!(reading.value, 500);

        let reading = converter.format(75.0, DisplayUnit::PercentGrade);
        assert!(!reading.saturated);
        assert_eq!(reading.value, 373);
    }

    #[test]
    fn test_non_finite_input() {
        let reading = format(f64::NAN, DisplayUnit::Degrees);
        assert_eq!(reading.value, 0);
        assert!(reading.saturated);

        let reading = format(f64::NEG_INFINITY, DisplayUnit::PercentGrade);
        assert_eq!(reading.value, -DEFAULT_PERCENT_GRADE_LIMIT);
    }

    #[test]
    fn test_unit_from_str() {
        assert_eq!("degrees".parse::<DisplayUnit>(), Ok(DisplayUnit::Degrees));
        assert_eq!("Percent".parse::<DisplayUnit>(), Ok(DisplayUnit::PercentGrade));
        assert!("radians".parse::<DisplayUnit>().is_err());
    }
}
