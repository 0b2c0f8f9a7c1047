//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, timeout, metrics)
//! - Construct the shared resilience state (breaker, admission controller)
//! - Serve with graceful shutdown

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::{middleware, Router};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::request_id::MakeRequestUuid;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tower_http::ServiceBuilderExt;

use crate::config::AppConfig;
use crate::http::handlers;
use crate::http::middleware::track_metrics;
use crate::resilience::{AdmissionController, CircuitBreaker};
use crate::upstream::{ClientError, UpstreamClient};

/// Application state injected into handlers.
///
/// The breaker and admission controller are the only shared mutable state in
/// the process; both live as long as the server.
#[derive(Clone)]
pub struct AppState {
    pub breaker: Arc<CircuitBreaker>,
    pub admission: Arc<AdmissionController>,
    pub upstream: Arc<UpstreamClient>,
    pub work_queue_limit: u32,
}

/// HTTP server for the service.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: AppConfig) -> Result<Self, ClientError> {
        let breaker = Arc::new(CircuitBreaker::from_config(&config.breaker));
        let admission = Arc::new(AdmissionController::new(config.admission.max_inflight));
        let upstream = Arc::new(UpstreamClient::new(&config.upstream)?);

        let state = AppState {
            breaker,
            admission,
            upstream,
            work_queue_limit: config.work.queue_limit,
        };

        let router = Self::build_router(&config, state.clone());
        Ok(Self { router, state })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &AppConfig, state: AppState) -> Router {
        Router::new()
            .route("/client", get(handlers::client))
            .route("/upstream", get(handlers::upstream))
            .route("/work", post(handlers::work))
            .route("/healthz", get(handlers::healthz))
            .with_state(state)
            .layer(middleware::from_fn(track_metrics))
            .layer(
                ServiceBuilder::new()
                    .set_x_request_id(MakeRequestUuid)
                    .layer(TraceLayer::new_for_http())
                    .layer(TimeoutLayer::new(Duration::from_secs(
                        config.listener.request_timeout_secs,
                    )))
                    .propagate_x_request_id(),
            )
    }

    /// Run the server until Ctrl+C.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        self.run_with_shutdown(listener, shutdown_signal()).await
    }

    /// Run the server until the given future resolves.
    pub async fn run_with_shutdown(
        self,
        listener: TcpListener,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Shared application state, mainly for inspection in tests.
    pub fn state(&self) -> &AppState {
        &self.state
    }
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received");
}
