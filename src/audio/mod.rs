// Audio module - level-reached tone cue

pub mod cue;
pub mod envelope;
#[cfg(feature = "cpal-audio")]
pub mod output_cpal;

pub use cue::{CountingOutput, LazyTone, ToneOutput};
pub use envelope::ToneEnvelope;
#[cfg(feature = "cpal-audio")]
pub use output_cpal::CpalOutput;

use crate::config::AudioConfig;

/// Fire-and-forget cue gated by an enable toggle
pub trait ToneCue: Send + Sync {
    /// Play once if enabled. Never blocks and never fails.
    fn play(&self);

    fn set_enabled(&self, enabled: bool);

    fn is_enabled(&self) -> bool;

    /// Flip the toggle and return the new state
    fn toggle(&self) -> bool {
        let enabled = !self.is_enabled();
        self.set_enabled(enabled);
        enabled
    }
}

/// Cue on the default output device
#[cfg(feature = "cpal-audio")]
pub fn default_tone(config: &AudioConfig) -> LazyTone {
    let tone = LazyTone::new(ToneEnvelope::from_config(config), || {
        CpalOutput::new().map(|output| Box::new(output) as Box<dyn ToneOutput>)
    });
    tone.set_enabled(config.enabled);
    tone
}

/// Cue that only counts plays (no audio backend compiled in)
#[cfg(not(feature = "cpal-audio"))]
pub fn default_tone(config: &AudioConfig) -> LazyTone {
    let tone = LazyTone::new(ToneEnvelope::from_config(config), || {
        Ok(Box::new(CountingOutput::new()) as Box<dyn ToneOutput>)
    });
    tone.set_enabled(config.enabled);
    tone
}
