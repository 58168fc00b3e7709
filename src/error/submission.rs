// Submission error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Submission error code constants
///
/// Error code range: 2001-2004
pub struct SubmissionErrorCodes {}

impl SubmissionErrorCodes {
    /// Endpoint answered with a non-2xx status
    pub const SERVER: i32 = 2001;

    /// Request never produced a response
    pub const NETWORK: i32 = 2002;

    /// Route has no trailing session id segment
    pub const MISSING_SESSION_ID: i32 = 2003;

    /// Endpoint URL or HTTP client could not be built
    pub const INVALID_ENDPOINT: i32 = 2004;
}

/// Log a submission error with structured context
pub fn log_submission_error(err: &SubmissionError, context: &str) {
    error!(
        "Submission error in {}: code={}, component=Submitter, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Errors raised while delivering the final pitch
///
/// Error code range: 2001-2004
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionError {
    /// Endpoint responded with a non-success HTTP status
    Server { status: u16 },

    /// Transport failure (connection refused, timeout, ...)
    Network { reason: String },

    /// The current route does not end in a session id
    MissingSessionId { path: String },

    /// The submission endpoint is malformed
    InvalidEndpoint { reason: String },
}

impl SubmissionError {
    /// HTTP status carried by the error, if the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            SubmissionError::Server { status } => Some(*status),
            _ => None,
        }
    }
}

impl ErrorCode for SubmissionError {
    fn code(&self) -> i32 {
        match self {
            SubmissionError::Server { .. } => SubmissionErrorCodes::SERVER,
            SubmissionError::Network { .. } => SubmissionErrorCodes::NETWORK,
            SubmissionError::MissingSessionId { .. } => SubmissionErrorCodes::MISSING_SESSION_ID,
            SubmissionError::InvalidEndpoint { .. } => SubmissionErrorCodes::INVALID_ENDPOINT,
        }
    }

    fn message(&self) -> String {
        match self {
            SubmissionError::Server { status } => {
                format!("Server rejected the measurement with status {}", status)
            }
            SubmissionError::Network { reason } => format!("Network error: {}", reason),
            SubmissionError::MissingSessionId { path } => {
                format!("No session id in route {:?}", path)
            }
            SubmissionError::InvalidEndpoint { reason } => {
                format!("Invalid submission endpoint: {}", reason)
            }
        }
    }
}

impl fmt::Display for SubmissionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SubmissionError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for SubmissionError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submission_error_codes() {
        assert_eq!(
            SubmissionError::Server { status: 500 }.code(),
            SubmissionErrorCodes::SERVER
        );
        assert_eq!(
            SubmissionError::Network {
                reason: "refused".to_string()
            }
            .code(),
            SubmissionErrorCodes::NETWORK
        );
        assert_eq!(
            SubmissionError::MissingSessionId {
                path: "/mobile/".to_string()
            }
            .code(),
            2003
        );
        assert_eq!(
            SubmissionError::InvalidEndpoint {
                reason: "bad".to_string()
            }
            .code(),
            2004
        );
    }

    #[test]
    fn test_server_error_exposes_status() {
        let err = SubmissionError::Server { status: 503 };
        assert_eq!(err.status(), Some(503));
        assert!(err.message().contains("503"));

        let err = SubmissionError::Network {
            reason: "timeout".to_string(),
        };
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_submission_error_display() {
        let err = SubmissionError::Server { status: 404 };
        let display = format!("{}", err);
        assert!(display.contains("SubmissionError"));
        assert!(display.contains("2001"));
    }
}
