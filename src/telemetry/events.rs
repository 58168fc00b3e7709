//! Session event types published to CLI/test observers.

use serde::{Deserialize, Serialize};

use crate::error::{ErrorCode, SessionError};
use crate::session::{SessionState, StatusKey};
use crate::stability::RoundedAngle;
use crate::units::DisplayReading;

/// Everything a host needs to render the measurement screen.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum SessionEvent {
    StateChanged {
        from: SessionState,
        to: SessionState,
    },
    Reading {
        pitch: RoundedAngle,
        display: DisplayReading,
    },
    Status {
        key: StatusKey,
        text: String,
    },
    ConfirmPrompt {
        final_pitch: RoundedAngle,
    },
    Submitting {
        value: RoundedAngle,
    },
    Error {
        code: i32,
        message: String,
    },
}

impl SessionEvent {
    pub fn error(err: &SessionError) -> Self {
        SessionEvent::Error {
            code: err.code(),
            message: err.message(),
        }
    }
}

/// Event stamped with the session clock.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TelemetryRecord {
    pub timestamp_ms: u64,
    #[serde(flatten)]
    pub event: SessionEvent,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_serializes_with_tagged_payload() {
        let record = TelemetryRecord {
            timestamp_ms: 1500,
            event: SessionEvent::ConfirmPrompt {
                final_pitch: RoundedAngle::from_degrees(22.5),
            },
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["timestamp_ms"], 1500);
        assert_eq!(json["type"], "confirm_prompt");
        assert_eq!(json["payload"]["final_pitch"], 225);
    }

    #[test]
    fn error_event_carries_code() {
        let event = SessionEvent::error(&SessionError::SubmitInFlight);
        assert!(matches!(event, SessionEvent::Error { code: 1006, .. }));
    }
}
