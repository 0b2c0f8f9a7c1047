//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use thiserror::Error;

use crate::config::schema::AppConfig;
use crate::config::validation::ValidationError;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid value {value:?} for {var}")]
    Env { var: &'static str, value: String },
    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration from a TOML file. No validation happens here; the
/// caller validates after all override layers are applied.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: AppConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Apply recognized environment variable overrides on top of the loaded
/// configuration.
pub fn apply_env_overrides(config: &mut AppConfig) -> Result<(), ConfigError> {
    if let Some(addr) = env_string("BIND_ADDRESS") {
        config.listener.bind_address = addr;
    }
    if let Some(url) = env_string("UPSTREAM_BASE_URL") {
        config.upstream.base_url = url;
    }
    if let Some(addr) = env_string("METRICS_ADDRESS") {
        config.observability.metrics_address = addr;
    }

    if let Some(n) = env_parsed("MAX_INFLIGHT")? {
        config.admission.max_inflight = n;
    }
    if let Some(n) = env_parsed("BREAKER_FAILURE_THRESHOLD")? {
        config.breaker.failure_threshold = n;
    }
    if let Some(n) = env_parsed("BREAKER_RECOVERY_TIMEOUT_MS")? {
        config.breaker.recovery_timeout_ms = n;
    }
    if let Some(n) = env_parsed("BREAKER_HALF_OPEN_TRIALS")? {
        config.breaker.half_open_trials = n;
    }
    if let Some(n) = env_parsed("UPSTREAM_TIMEOUT_MS")? {
        config.upstream.timeout_ms = n;
    }

    Ok(())
}

fn env_string(var: &'static str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.is_empty())
}

fn env_parsed<T: FromStr>(var: &'static str) -> Result<Option<T>, ConfigError> {
    match env_string(var) {
        Some(value) => value
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::Env { var, value }),
        None => Ok(None),
    }
}
