//! Tone envelope - the short "level reached" beep
//!
//! A sine at a fixed frequency, ramped linearly from silence to the peak gain
//! over the attack and back to silence at the end of the tone. Rendering is a
//! pure function of the envelope and the sample rate.

use std::f32::consts::TAU;

use crate::config::AudioConfig;

/// Shape of the level tone
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneEnvelope {
    pub frequency_hz: f32,
    pub peak_gain: f32,
    pub attack_ms: u32,
    pub duration_ms: u32,
}

impl Default for ToneEnvelope {
    /// 880 Hz (A5), 10ms attack to 0.5, silent again at 100ms
    fn default() -> Self {
        Self {
            frequency_hz: 880.0,
            peak_gain: 0.5,
            attack_ms: 10,
            duration_ms: 100,
        }
    }
}

impl ToneEnvelope {
    pub fn from_config(config: &AudioConfig) -> Self {
        Self {
            frequency_hz: config.frequency_hz,
            peak_gain: config.peak_gain,
            attack_ms: config.attack_ms.min(config.duration_ms),
            duration_ms: config.duration_ms,
        }
    }

    /// Gain at `t_ms` after the tone starts
    pub fn gain_at(&self, t_ms: f32) -> f32 {
        let attack = self.attack_ms as f32;
        let duration = self.duration_ms as f32;

        if t_ms <= 0.0 || t_ms >= duration {
            0.0
        } else if t_ms < attack {
            self.peak_gain * t_ms / attack
        } else {
            let release = duration - attack;
            if release <= 0.0 {
                0.0
            } else {
                self.peak_gain * (duration - t_ms) / release
            }
        }
    }

    /// Number of mono samples the tone lasts at `sample_rate`
    pub fn sample_count(&self, sample_rate: u32) -> usize {
        (sample_rate as u64 * self.duration_ms as u64 / 1000) as usize
    }

    /// Render the tone as mono f32 samples in [-peak_gain, peak_gain]
    pub fn render(&self, sample_rate: u32) -> Vec<f32> {
        let count = self.sample_count(sample_rate);
        let rate = sample_rate as f32;

        (0..count)
            .map(|i| {
                let t = i as f32 / rate;
                (TAU * self.frequency_hz * t).sin() * self.gain_at(t * 1000.0)
            })
            .collect()
    }
}
