// ScriptedSubmitter - in-process submitter with preset outcomes
//
// Used by the CLI when no endpoint is configured and by session tests that
// need to hold a submission open.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures::future::BoxFuture;

use super::Submitter;
use crate::error::SubmissionError;
use crate::stability::RoundedAngle;

#[derive(Debug, Default)]
struct ScriptState {
    outcomes: VecDeque<Result<(), SubmissionError>>,
    received: Vec<RoundedAngle>,
}

/// Answers each submit with the next queued outcome, then `Ok(())`
#[derive(Debug, Clone, Default)]
pub struct ScriptedSubmitter {
    state: Arc<Mutex<ScriptState>>,
    delay: Duration,
}

impl ScriptedSubmitter {
    pub fn new(outcomes: Vec<Result<(), SubmissionError>>) -> Self {
        Self {
            state: Arc::new(Mutex::new(ScriptState {
                outcomes: outcomes.into(),
                received: Vec::new(),
            })),
            delay: Duration::ZERO,
        }
    }

    pub fn always_ok() -> Self {
        Self::default()
    }

    /// Each submission resolves after `delay`
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Values submitted so far, in order
    pub fn received(&self) -> Vec<RoundedAngle> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .received
            .clone()
    }
}

impl Submitter for ScriptedSubmitter {
    fn submit(&self, value: RoundedAngle) -> BoxFuture<'static, Result<(), SubmissionError>> {
        let outcome = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            state.received.push(value);
            state.outcomes.pop_front().unwrap_or(Ok(()))
        };
        let delay = self.delay;

        Box::pin(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            log::info!("[ScriptedSubmitter] value={} -> {:?}", value, outcome);
            outcome
        })
    }
}
