// Error types for the pitch gauge
//
// This module defines custom error types for measurement sessions, pitch
// submission and tone output, providing structured error handling with
// stable numeric codes that the CLI and event stream can report.

mod audio;
mod session;
mod submission;

pub use audio::{log_audio_error, AudioError, AudioErrorCodes};
pub use session::{log_session_error, SessionError, SessionErrorCodes};
pub use submission::{log_submission_error, SubmissionError, SubmissionErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, enabling consistent error reporting across
/// the event stream and CLI output.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}
