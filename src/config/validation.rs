//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (thresholds and timeouts > 0)
//! - Check that addresses and URLs actually parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs once, after file, environment and CLI overrides

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::AppConfig;

/// A single semantic configuration problem.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("listener.bind_address {0:?} is not a valid socket address")]
    InvalidBindAddress(String),
    #[error("observability.metrics_address {0:?} is not a valid socket address")]
    InvalidMetricsAddress(String),
    #[error("upstream.base_url {0:?} is not a valid URL")]
    InvalidUpstreamUrl(String),
    #[error("upstream.timeout_ms must be at least 1")]
    ZeroUpstreamTimeout,
    #[error("breaker.failure_threshold must be at least 1")]
    ZeroFailureThreshold,
    #[error("breaker.half_open_trials must be at least 1")]
    ZeroHalfOpenTrials,
    #[error("admission.max_inflight must be at least 1")]
    ZeroMaxInflight,
}

/// Validate the full configuration, collecting every problem.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }
    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }
    if Url::parse(&config.upstream.base_url).is_err() {
        errors.push(ValidationError::InvalidUpstreamUrl(
            config.upstream.base_url.clone(),
        ));
    }
    if config.upstream.timeout_ms == 0 {
        errors.push(ValidationError::ZeroUpstreamTimeout);
    }
    if config.breaker.failure_threshold == 0 {
        errors.push(ValidationError::ZeroFailureThreshold);
    }
    if config.breaker.half_open_trials == 0 {
        errors.push(ValidationError::ZeroHalfOpenTrials);
    }
    if config.admission.max_inflight == 0 {
        errors.push(ValidationError::ZeroMaxInflight);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
