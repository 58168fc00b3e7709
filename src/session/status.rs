// Status messages surfaced to the user
//
// The session never produces display text itself: it emits a status key plus
// an optional detail (locked value, HTTP status) and the host renders it
// through the localized catalog.

use serde::{Deserialize, Serialize};

/// Keys into the localized string table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusKey {
    #[serde(rename = "status-initial")]
    Initial,
    #[serde(rename = "status-measuring")]
    Measuring,
    #[serde(rename = "gyro-instructions")]
    Instructions,
    #[serde(rename = "status-holding")]
    Holding,
    #[serde(rename = "status-finished")]
    Finished,
    #[serde(rename = "status-success")]
    Success,
    #[serde(rename = "error-gyro")]
    SensorError,
    #[serde(rename = "error-permission")]
    PermissionError,
    #[serde(rename = "error-request")]
    RequestError,
    #[serde(rename = "error-server")]
    ServerError,
    #[serde(rename = "error-network")]
    NetworkError,
}

impl StatusKey {
    pub const ALL: [StatusKey; 11] = [
        StatusKey::Initial,
        StatusKey::Measuring,
        StatusKey::Instructions,
        StatusKey::Holding,
        StatusKey::Finished,
        StatusKey::Success,
        StatusKey::SensorError,
        StatusKey::PermissionError,
        StatusKey::RequestError,
        StatusKey::ServerError,
        StatusKey::NetworkError,
    ];

    /// Key used in the translation table
    pub fn as_key(&self) -> &'static str {
        match self {
            StatusKey::Initial => "status-initial",
            StatusKey::Measuring => "status-measuring",
            StatusKey::Instructions => "gyro-instructions",
            StatusKey::Holding => "status-holding",
            StatusKey::Finished => "status-finished",
            StatusKey::Success => "status-success",
            StatusKey::SensorError => "error-gyro",
            StatusKey::PermissionError => "error-permission",
            StatusKey::RequestError => "error-request",
            StatusKey::ServerError => "error-server",
            StatusKey::NetworkError => "error-network",
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(
            self,
            StatusKey::SensorError
                | StatusKey::PermissionError
                | StatusKey::RequestError
                | StatusKey::ServerError
                | StatusKey::NetworkError
        )
    }
}

/// Status key plus the detail appended after the localized text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusMessage {
    pub key: StatusKey,
    pub detail: Option<String>,
}

impl StatusMessage {
    pub fn new(key: StatusKey) -> Self {
        Self { key, detail: None }
    }

    pub fn with_detail(key: StatusKey, detail: impl Into<String>) -> Self {
        Self {
            key,
            detail: Some(detail.into()),
        }
    }
}
