// HttpSubmitter - form POST of the locked value

use std::time::Duration;

use futures::future::BoxFuture;

use super::{SubmissionTarget, Submitter};
use crate::error::{log_submission_error, SubmissionError};
use crate::stability::RoundedAngle;

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Posts `value=<pitch>` as `application/x-www-form-urlencoded`
///
/// Any 2xx response counts as delivered. Other statuses become
/// `SubmissionError::Server`, transport failures `SubmissionError::Network`.
#[derive(Debug, Clone)]
pub struct HttpSubmitter {
    client: reqwest::Client,
    target: SubmissionTarget,
}

impl HttpSubmitter {
    pub fn new(target: SubmissionTarget) -> Result<Self, SubmissionError> {
        Self::with_timeout(target, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(target: SubmissionTarget, timeout: Duration) -> Result<Self, SubmissionError> {
        let url = target.url();
        reqwest::Url::parse(&url).map_err(|err| SubmissionError::InvalidEndpoint {
            reason: format!("{}: {}", url, err),
        })?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| SubmissionError::InvalidEndpoint {
                reason: err.to_string(),
            })?;

        Ok(Self { client, target })
    }

    pub fn target(&self) -> &SubmissionTarget {
        &self.target
    }
}

impl Submitter for HttpSubmitter {
    fn submit(&self, value: RoundedAngle) -> BoxFuture<'static, Result<(), SubmissionError>> {
        let client = self.client.clone();
        let url = self.target.url();

        Box::pin(async move {
            log::info!("[HttpSubmitter] POST {} value={}", url, value);
            let response = client
                .post(&url)
                .form(&[("value", value.to_string())])
                .send()
                .await
                .map_err(|err| SubmissionError::Network {
                    reason: err.to_string(),
                });

            let result = match response {
                Ok(resp) if resp.status().is_success() => Ok(()),
                Ok(resp) => Err(SubmissionError::Server {
                    status: resp.status().as_u16(),
                }),
                Err(err) => Err(err),
            };

            if let Err(err) = &result {
                log_submission_error(err, "HttpSubmitter::submit");
            }
            result
        })
    }
}
