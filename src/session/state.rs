// SessionState - lifecycle of one roof-pitch capture

use serde::{Deserialize, Serialize};

/// Where the measurement session currently is
///
/// Idle → (AwaitingPermission →) Measuring → Locked → Submitted.
/// Locked may return to Measuring ("measure again"); Submitted is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    Idle,
    AwaitingPermission,
    Measuring,
    Locked,
    Submitted,
}

impl SessionState {
    /// States in which a sample subscription and poll timer are live
    pub fn is_sampling(&self) -> bool {
        matches!(self, SessionState::Measuring)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Submitted)
    }
}
