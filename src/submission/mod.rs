//! Delivery of the locked roof pitch.
//!
//! The session only knows the [`Submitter`] trait: it hands over the locked
//! value and later receives `Ok(())` or a [`SubmissionError`]. The HTTP
//! implementation posts a form to `{base_url}{base_route}/{session_id}`.

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::error::SubmissionError;
use crate::stability::RoundedAngle;

pub mod http;
pub mod scripted;

pub use http::HttpSubmitter;
pub use scripted::ScriptedSubmitter;

/// Transport for the locked value.
pub trait Submitter: Send + Sync {
    fn submit(&self, value: RoundedAngle) -> BoxFuture<'static, Result<(), SubmissionError>>;
}

/// Where a session's value is posted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionTarget {
    pub base_url: String,
    pub base_route: String,
    pub session_id: String,
}

impl SubmissionTarget {
    pub fn new(
        base_url: impl Into<String>,
        base_route: impl Into<String>,
        session_id: impl Into<String>,
    ) -> Result<Self, SubmissionError> {
        let session_id = session_id.into();
        if session_id.is_empty() || session_id.contains('/') {
            return Err(SubmissionError::MissingSessionId { path: session_id });
        }
        Ok(Self {
            base_url: base_url.into(),
            base_route: base_route.into(),
            session_id,
        })
    }

    /// Target for the session named by the last segment of `path`.
    pub fn from_path(
        base_url: impl Into<String>,
        base_route: impl Into<String>,
        path: &str,
    ) -> Result<Self, SubmissionError> {
        let session_id = session_id_from_path(path)?;
        Self::new(base_url, base_route, session_id)
    }

    pub fn url(&self) -> String {
        format!(
            "{}{}/{}",
            self.base_url.trim_end_matches('/'),
            normalize_route(&self.base_route),
            self.session_id
        )
    }
}

/// Final path segment of a route such as `/mobile/12345`.
///
/// Query strings and fragments are ignored. A path ending in `/` has an empty
/// final segment and is rejected.
pub fn session_id_from_path(path: &str) -> Result<String, SubmissionError> {
    let path_only = path.split(['?', '#']).next().unwrap_or_default();
    match path_only.rsplit('/').next() {
        Some(segment) if !segment.is_empty() => Ok(segment.to_string()),
        _ => Err(SubmissionError::MissingSessionId {
            path: path.to_string(),
        }),
    }
}

/// `mobile`, `/mobile/` and `/mobile` all become `/mobile`; empty stays empty.
fn normalize_route(route: &str) -> String {
    let trimmed = route.trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}
