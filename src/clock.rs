//! Millisecond time sources used to stamp samples and judge stability.

use std::sync::atomic::{AtomicU64, Ordering};

/// Trait representing a monotonic millisecond clock.
pub trait TimeSource: Send + Sync {
    fn now_ms(&self) -> u64;
}

/// Clock backed by `tokio::time::Instant`, so paused test time applies.
pub struct TokioTimeSource {
    start: tokio::time::Instant,
}

impl TokioTimeSource {
    pub fn new() -> Self {
        Self {
            start: tokio::time::Instant::now(),
        }
    }
}

impl Default for TokioTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for TokioTimeSource {
    fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

/// Manually driven clock for deterministic tests and replays.
#[derive(Default)]
pub struct ManualTimeSource {
    now_ms: AtomicU64,
}

impl ManualTimeSource {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now_ms: AtomicU64::new(start_ms),
        }
    }

    pub fn set(&self, ms: u64) {
        self.now_ms.store(ms, Ordering::SeqCst);
    }

    pub fn advance(&self, ms: u64) -> u64 {
        self.now_ms.fetch_add(ms, Ordering::SeqCst) + ms
    }
}

impl TimeSource for ManualTimeSource {
    fn now_ms(&self) -> u64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}
