// Measurement session error types and constants

use crate::error::{ErrorCode, SubmissionError};
use crate::session::SessionState;
use log::error;
use std::fmt;

/// Session error code constants
///
/// These constants are the single source of truth for the codes reported in
/// `SessionEvent::Error` and CLI output.
///
/// Error code range: 1001-1008
pub struct SessionErrorCodes {}

impl SessionErrorCodes {
    /// Sensor delivered a reading without orientation data
    pub const SENSOR_UNAVAILABLE: i32 = 1001;

    /// User or platform refused sensor access
    pub const PERMISSION_DENIED: i32 = 1002;

    /// Authorization request itself failed
    pub const PERMISSION_REQUEST_FAILED: i32 = 1003;

    /// Action not allowed in the current state
    pub const INVALID_TRANSITION: i32 = 1004;

    /// Submit requested before a value was locked
    pub const NOTHING_TO_SUBMIT: i32 = 1005;

    /// Submit requested while a previous submit is unresolved
    pub const SUBMIT_IN_FLIGHT: i32 = 1006;

    /// Sensor feed could not be subscribed
    pub const SENSOR_SUBSCRIPTION_FAILED: i32 = 1007;

    /// Locked value could not be delivered
    pub const SUBMISSION_FAILED: i32 = 1008;
}

/// Log a session error with structured context
///
/// This function logs session errors with the numeric code, the component
/// and the calling context. It never panics.
pub fn log_session_error(err: &SessionError, context: &str) {
    error!(
        "Session error in {}: code={}, component=MeasurementSession, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Measurement session errors
///
/// None of these are fatal: each is surfaced as status text and the session
/// either stays where it is or returns to Idle.
///
/// Error code range: 1001-1008
#[derive(Debug, Clone, PartialEq)]
pub enum SessionError {
    /// Sensor reported null orientation data
    SensorUnavailable,

    /// Sensor authorization was denied
    PermissionDenied,

    /// Sensor authorization request failed
    PermissionRequestFailed { reason: String },

    /// Requested action is not valid in the current state
    InvalidTransition {
        state: SessionState,
        action: &'static str,
    },

    /// No locked value to submit
    NothingToSubmit,

    /// A submission is already awaiting its outcome
    SubmitInFlight,

    /// Sensor subscription could not be established
    SensorSubscriptionFailed { reason: String },

    /// Locked value could not be delivered
    SubmissionFailed(SubmissionError),
}

impl ErrorCode for SessionError {
    fn code(&self) -> i32 {
        match self {
            SessionError::SensorUnavailable => SessionErrorCodes::SENSOR_UNAVAILABLE,
            SessionError::PermissionDenied => SessionErrorCodes::PERMISSION_DENIED,
            SessionError::PermissionRequestFailed { .. } => {
                SessionErrorCodes::PERMISSION_REQUEST_FAILED
            }
            SessionError::InvalidTransition { .. } => SessionErrorCodes::INVALID_TRANSITION,
            SessionError::NothingToSubmit => SessionErrorCodes::NOTHING_TO_SUBMIT,
            SessionError::SubmitInFlight => SessionErrorCodes::SUBMIT_IN_FLIGHT,
            SessionError::SensorSubscriptionFailed { .. } => {
                SessionErrorCodes::SENSOR_SUBSCRIPTION_FAILED
            }
            SessionError::SubmissionFailed(_) => SessionErrorCodes::SUBMISSION_FAILED,
        }
    }

    fn message(&self) -> String {
        match self {
            SessionError::SensorUnavailable => "Orientation sensor unavailable".to_string(),
            SessionError::PermissionDenied => "Sensor permission denied".to_string(),
            SessionError::PermissionRequestFailed { reason } => {
                format!("Sensor permission request failed: {}", reason)
            }
            SessionError::InvalidTransition { state, action } => {
                format!("Cannot {} while {:?}", action, state)
            }
            SessionError::NothingToSubmit => "No locked pitch to submit".to_string(),
            SessionError::SubmitInFlight => "Submission already in progress".to_string(),
            SessionError::SensorSubscriptionFailed { reason } => {
                format!("Failed to subscribe to sensor: {}", reason)
            }
            SessionError::SubmissionFailed(err) => err.message(),
        }
    }
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SessionError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for SessionError {}

impl From<SubmissionError> for SessionError {
    fn from(err: SubmissionError) -> Self {
        SessionError::SubmissionFailed(err)
    }
}
