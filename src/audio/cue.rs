// LazyTone - fire-and-forget level cue with a lazily built output
//
// The output backend is built on the first cue that actually plays, then
// reused. A build failure is logged and that cue is skipped; the next cue
// tries again.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use once_cell::sync::OnceCell;

use super::envelope::ToneEnvelope;
use super::ToneCue;
use crate::error::{log_audio_error, AudioError};

/// Something that can play a rendered envelope without blocking the caller
pub trait ToneOutput: Send + Sync {
    fn play(&self, envelope: &ToneEnvelope) -> Result<(), AudioError>;
}

type OutputFactory = Box<dyn Fn() -> Result<Box<dyn ToneOutput>, AudioError> + Send + Sync>;

/// Cue gated by an enable toggle, default off
pub struct LazyTone {
    enabled: AtomicBool,
    envelope: ToneEnvelope,
    factory: OutputFactory,
    output: OnceCell<Box<dyn ToneOutput>>,
    played: AtomicU64,
}

impl LazyTone {
    pub fn new<F>(envelope: ToneEnvelope, factory: F) -> Self
    where
        F: Fn() -> Result<Box<dyn ToneOutput>, AudioError> + Send + Sync + 'static,
    {
        Self {
            enabled: AtomicBool::new(false),
            envelope,
            factory: Box::new(factory),
            output: OnceCell::new(),
            played: AtomicU64::new(0),
        }
    }

    /// Whether the output has been built
    pub fn is_initialized(&self) -> bool {
        self.output.get().is_some()
    }

    /// Cues that reached the output
    pub fn played(&self) -> u64 {
        self.played.load(Ordering::Relaxed)
    }

    pub fn envelope(&self) -> &ToneEnvelope {
        &self.envelope
    }
}

impl ToneCue for LazyTone {
    fn play(&self) {
        if !self.is_enabled() {
            return;
        }

        let output = match self.output.get_or_try_init(|| (self.factory)()) {
            Ok(output) => output,
            Err(err) => {
                log_audio_error(&err, "LazyTone::play (init)");
                return;
            }
        };

        match output.play(&self.envelope) {
            Ok(()) => {
                self.played.fetch_add(1, Ordering::Relaxed);
            }
            Err(err) => log_audio_error(&err, "LazyTone::play"),
        }
    }

    fn set_enabled(&self, enabled: bool) {
        log::info!("[LazyTone] Audio cue {}", if enabled { "enabled" } else { "disabled" });
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }
}

/// Output that only counts what it was asked to play
///
/// Used by headless hosts and tests.
#[derive(Debug, Clone, Default)]
pub struct CountingOutput {
    count: Arc<AtomicU64>,
}

impl CountingOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}

impl ToneOutput for CountingOutput {
    fn play(&self, envelope: &ToneEnvelope) -> Result<(), AudioError> {
        log::debug!(
            "[CountingOutput] tone {}Hz for {}ms",
            envelope.frequency_hz,
            envelope.duration_ms
        );
        self.count.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
