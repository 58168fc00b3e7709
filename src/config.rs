//! Configuration management for measurement tuning
//!
//! Runtime configuration is loaded from a JSON file so thresholds, poll
//! cadence, display units and the submission endpoint can be changed without
//! recompiling. Every section falls back to its defaults when missing.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::stability::DEFAULT_THRESHOLD_MS;
use crate::units::{DisplayUnit, DEFAULT_PERCENT_GRADE_LIMIT};

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub stability: StabilityConfig,
    pub display: DisplayConfig,
    pub bubble: BubbleConfig,
    pub submission: SubmissionConfig,
    pub audio: AudioConfig,
    pub locale: LocaleConfig,
}

/// Stability detection parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StabilityConfig {
    /// How long the rounded pitch must stay constant before it locks
    pub threshold_ms: u64,
    /// Cadence of the stability check, independent of the sensor rate
    pub poll_interval_ms: u64,
}

impl Default for StabilityConfig {
    fn default() -> Self {
        Self {
            threshold_ms: DEFAULT_THRESHOLD_MS,
            poll_interval_ms: 500,
        }
    }
}

impl StabilityConfig {
    /// Poll interval, never zero
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

/// Display formatting
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub unit: DisplayUnit,
    /// Percent-grade values saturate at ± this value
    pub percent_grade_limit: i64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            unit: DisplayUnit::Degrees,
            percent_grade_limit: DEFAULT_PERCENT_GRADE_LIMIT,
        }
    }
}

/// Bubble level mapping
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BubbleConfig {
    /// Pixels of bubble travel per degree of tilt
    pub multiplier: f64,
    /// Maximum bubble travel in either direction
    pub max_offset: f64,
}

impl Default for BubbleConfig {
    fn default() -> Self {
        Self {
            multiplier: 5.0,
            max_offset: 100.0,
        }
    }
}

/// Where locked values are posted
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmissionConfig {
    pub base_url: String,
    pub base_route: String,
    pub timeout_ms: u64,
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            base_route: "/mobile".to_string(),
            timeout_ms: 10_000,
        }
    }
}

impl SubmissionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Level tone
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Tone enabled at startup
    pub enabled: bool,
    pub frequency_hz: f32,
    pub peak_gain: f32,
    pub attack_ms: u32,
    pub duration_ms: u32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            frequency_hz: 880.0,
            peak_gain: 0.5,
            attack_ms: 10,
            duration_ms: 100,
        }
    }
}

/// Status text language
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocaleConfig {
    pub language: String,
    /// Optional translation table layered over the built-in one
    pub translations_path: Option<String>,
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            translations_path: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// The loaded configuration, or the defaults if the file is missing or
    /// its JSON is invalid.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Load configuration from the bundled assets directory
    pub fn load() -> Self {
        Self::load_from_file("assets/pitch_gauge.json")
    }
}
