//! Session telemetry collector.
//!
//! The collector fans session events out to any number of observers through a
//! broadcast channel and keeps a bounded history for late readers (CLI summary,
//! tests).

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::{broadcast, mpsc};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};

pub mod events;

pub use events::{SessionEvent, TelemetryRecord};

/// Snapshot of collector state for CLI reporting.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TelemetrySnapshot {
    pub recent: Vec<TelemetryRecord>,
    pub total_events: u64,
    pub dropped_events: u64,
}

/// Broadcast-based collector retaining a bounded history of session events.
pub struct TelemetryCollector {
    tx: broadcast::Sender<TelemetryRecord>,
    history: Mutex<VecDeque<TelemetryRecord>>,
    history_capacity: usize,
    total_events: AtomicU64,
    dropped_history: AtomicU64,
}

impl TelemetryCollector {
    pub fn new(buffer: usize, history_capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(buffer.max(1));
        Self {
            tx,
            history: Mutex::new(VecDeque::with_capacity(history_capacity)),
            history_capacity,
            total_events: AtomicU64::new(0),
            dropped_history: AtomicU64::new(0),
        }
    }

    pub fn publish(&self, timestamp_ms: u64, event: SessionEvent) {
        let record = TelemetryRecord {
            timestamp_ms,
            event,
        };
        self.total_events.fetch_add(1, Ordering::Relaxed);
        {
            let mut history = self.history();
            if self.history_capacity > 0 {
                if history.len() == self.history_capacity {
                    history.pop_front();
                    self.dropped_history.fetch_add(1, Ordering::Relaxed);
                }
                history.push_back(record.clone());
            }
        }

        let _ = self.tx.send(record);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TelemetryRecord> {
        self.tx.subscribe()
    }

    /// Stream of records; lagged gaps are skipped.
    pub fn stream(&self) -> impl Stream<Item = TelemetryRecord> {
        BroadcastStream::new(self.tx.subscribe()).filter_map(|item| item.ok())
    }

    pub fn subscribe_unbounded(&self) -> mpsc::UnboundedReceiver<TelemetryRecord> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut broadcast_rx = self.tx.subscribe();

        tokio::spawn(async move {
            while let Ok(record) = broadcast_rx.recv().await {
                if tx.send(record).is_err() {
                    break;
                }
            }
        });

        rx
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        let history = self.history();
        TelemetrySnapshot {
            recent: history.iter().cloned().collect(),
            total_events: self.total_events.load(Ordering::Relaxed),
            dropped_events: self.dropped_history.load(Ordering::Relaxed),
        }
    }

    fn history(&self) -> MutexGuard<'_, VecDeque<TelemetryRecord>> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for TelemetryCollector {
    fn default() -> Self {
        Self::new(256, 256)
    }
}
