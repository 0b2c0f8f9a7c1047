//! Load Shed API
//!
//! A demo service exercising resilience controls against an unreliable
//! upstream, built with Tokio and Axum.
//!
//! # Control Flow
//!
//! ```text
//! inbound /client request
//!     → admission control (reserve a slot, or shed with 429)
//!     → circuit breaker (allow, or fail fast with 503)
//!     → bounded-timeout upstream call
//!     → outcome classification (ok / error / timeout)
//!     → breaker feedback + metrics
//!     → response
//! ```
//!
//! `/upstream` simulates the unreliable dependency (injected delay and
//! failure probability), `/work` simulates a sheddable worker, `/healthz`
//! reports process liveness, and Prometheus metrics are exposed on a
//! dedicated listener.

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use loadshed_api::config::validation::validate_config;
use loadshed_api::config::{loader, AppConfig};
use loadshed_api::HttpServer;

#[derive(Parser)]
#[command(name = "loadshed-api")]
#[command(about = "Demo API with circuit breaking and load shedding", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "loadshed_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("loadshed-api v0.1.0 starting");

    // Load configuration: file, then environment, then CLI overrides.
    let mut config = match &cli.config {
        Some(path) => loader::load_config(path)?,
        None => AppConfig::default(),
    };
    loader::apply_env_overrides(&mut config)?;
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }
    validate_config(&config).map_err(loader::ConfigError::Validation)?;

    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream_base_url = %config.upstream.base_url,
        upstream_timeout_ms = config.upstream.timeout_ms,
        max_inflight = config.admission.max_inflight,
        failure_threshold = config.breaker.failure_threshold,
        recovery_timeout_ms = config.breaker.recovery_timeout_ms,
        half_open_trials = config.breaker.half_open_trials,
        "Configuration loaded"
    );

    // Start the metrics listener before the breaker publishes its state.
    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            loadshed_api::observability::metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    // Bind TCP listener
    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!(
        address = %local_addr,
        "Listening for connections"
    );

    // Create and run HTTP server
    let server = HttpServer::new(config)?;
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
