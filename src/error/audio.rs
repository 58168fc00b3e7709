// Tone output error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Audio error code constants
///
/// Error code range: 3001-3003
pub struct AudioErrorCodes {}

impl AudioErrorCodes {
    /// No usable output device
    pub const DEVICE_UNAVAILABLE: i32 = 3001;

    /// Output stream could not be opened or started
    pub const STREAM_OPEN_FAILED: i32 = 3002;

    /// Output device uses a sample format the tone renderer cannot produce
    pub const UNSUPPORTED_FORMAT: i32 = 3003;
}

/// Log an audio error with structured context
///
/// Tone failures are never fatal, so this is the only place they surface.
pub fn log_audio_error(err: &AudioError, context: &str) {
    error!(
        "Audio error in {}: code={}, component=ToneCue, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Tone output errors
///
/// Error code range: 3001-3003
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioError {
    /// No default output device
    DeviceUnavailable { reason: String },

    /// Failed to build or start the output stream
    StreamOpenFailed { reason: String },

    /// Device sample format not supported
    UnsupportedFormat { format: String },
}

impl ErrorCode for AudioError {
    fn code(&self) -> i32 {
        match self {
            AudioError::DeviceUnavailable { .. } => AudioErrorCodes::DEVICE_UNAVAILABLE,
            AudioError::StreamOpenFailed { .. } => AudioErrorCodes::STREAM_OPEN_FAILED,
            AudioError::UnsupportedFormat { .. } => AudioErrorCodes::UNSUPPORTED_FORMAT,
        }
    }

    fn message(&self) -> String {
        match self {
            AudioError::DeviceUnavailable { reason } => {
                format!("No audio output device: {}", reason)
            }
            AudioError::StreamOpenFailed { reason } => {
                format!("Failed to open output stream: {}", reason)
            }
            AudioError::UnsupportedFormat { format } => {
                format!("Unsupported output sample format: {}", format)
            }
        }
    }
}

impl fmt::Display for AudioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AudioError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for AudioError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_error_codes() {
        assert_eq!(
            AudioError::DeviceUnavailable {
                reason: "none".to_string()
            }
            .code(),
            3001
        );
        assert_eq!(
            AudioError::StreamOpenFailed {
                reason: "busy".to_string()
            }
            .code(),
            3002
        );
        assert_eq!(
            AudioError::UnsupportedFormat {
                format: "I24".to_string()
            }
            .code(),
            3003
        );
    }

    #[test]
    fn test_display_contains_code() {
        let err = AudioError::DeviceUnavailable {
            reason: "headless".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("3001"));
        assert!(text.contains("headless"));
    }
}
