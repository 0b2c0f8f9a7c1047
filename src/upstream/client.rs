//! Bounded-timeout client for the upstream dependency.
//!
//! # Responsibilities
//! - Issue one HTTP call per attempt with a hard per-request deadline
//! - Distinguish deadline-exceeded from explicit upstream failure
//! - Never block the handler beyond the deadline; the in-flight call is
//!   abandoned when the timeout fires

use std::time::{Duration, Instant};

use thiserror::Error;
use url::Url;

use crate::config::UpstreamConfig;
use crate::resilience::Outcome;

/// Failure to construct the client.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid upstream base URL: {0}")]
    BaseUrl(#[from] url::ParseError),
    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

/// Classified failure of one upstream attempt.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("upstream call exceeded the {0:?} deadline")]
    Timeout(Duration),
    #[error("upstream returned status {0}")]
    Status(u16),
    #[error("upstream transport error: {0}")]
    Transport(reqwest::Error),
}

impl UpstreamError {
    /// Map to the outcome taxonomy. Transport and status failures are both
    /// "error"; only deadline exhaustion is "timeout".
    pub fn outcome(&self) -> Outcome {
        match self {
            UpstreamError::Timeout(_) => Outcome::Timeout,
            UpstreamError::Status(_) | UpstreamError::Transport(_) => Outcome::Error,
        }
    }
}

/// HTTP client bound to the configured upstream base URL.
pub struct UpstreamClient {
    http: reqwest::Client,
    endpoint: Url,
    default_timeout: Duration,
}

impl UpstreamClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self, ClientError> {
        let base = Url::parse(&config.base_url)?;
        let endpoint = base.join("/upstream")?;
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .build()?;
        Ok(Self {
            http,
            endpoint,
            default_timeout: Duration::from_millis(config.timeout_ms),
        })
    }

    /// Configured per-call deadline, used when the request does not override it.
    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Issue one bounded call, passing the simulation parameters through.
    ///
    /// Returns the measured latency of the attempt alongside its result, so
    /// the caller can record latency for ok, error and timeout alike.
    pub async fn call(
        &self,
        ms: u64,
        fail_rate: f64,
        timeout: Duration,
    ) -> (Duration, Result<(), UpstreamError>) {
        let started = Instant::now();
        let response = self
            .http
            .get(self.endpoint.clone())
            .query(&[("ms", ms.to_string()), ("fail_rate", fail_rate.to_string())])
            .timeout(timeout)
            .send()
            .await;
        let latency = started.elapsed();

        let result = match response {
            Ok(resp) if resp.status().is_success() => Ok(()),
            Ok(resp) => Err(UpstreamError::Status(resp.status().as_u16())),
            Err(e) if e.is_timeout() => Err(UpstreamError::Timeout(timeout)),
            Err(e) => Err(UpstreamError::Transport(e)),
        };
        (latency, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base_url: &str) -> UpstreamConfig {
        UpstreamConfig {
            base_url: base_url.to_string(),
            ..UpstreamConfig::default()
        }
    }

    #[test]
    fn rejects_invalid_base_url() {
        assert!(UpstreamClient::new(&config("not a url")).is_err());
        assert!(UpstreamClient::new(&config("http://127.0.0.1:8080")).is_ok());
    }

    #[test]
    fn error_classification_matches_taxonomy() {
        assert_eq!(
            UpstreamError::Timeout(Duration::from_millis(200)).outcome(),
            Outcome::Timeout
        );
        assert_eq!(UpstreamError::Status(503).outcome(), Outcome::Error);
    }
}
