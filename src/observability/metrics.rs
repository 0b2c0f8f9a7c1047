//! Metrics collection and exposition.
//!
//! # Metrics
//! - `http_requests_total` (counter): inbound requests by method, path, status
//! - `http_request_duration_seconds` (histogram): inbound latency
//! - `http_inflight_requests` (gauge): inbound requests currently handled
//! - `upstream_requests_total` (counter): client-path attempts by outcome
//!   (ok, error, timeout, breaker_open, shed)
//! - `upstream_request_duration_seconds` (histogram): upstream attempt latency
//! - `circuit_breaker_state` (gauge): 0=Closed, 1=Open, 2=HalfOpen
//! - `admission_in_flight` (gauge): slots currently held on the client path
//! - `work_items_total` (counter), `work_queue_depth` (gauge): simulated worker
//!
//! # Design Decisions
//! - Exposition runs on a dedicated listener, separate from the service port
//! - Updates go through the `metrics` facade; without an installed recorder
//!   (as in tests) they are no-ops
//! - Histogram buckets tuned for typical web latencies

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder};

use crate::resilience::{BreakerState, Outcome};

const LATENCY_BUCKETS: &[f64] = &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.0, 5.0];

/// Install the Prometheus recorder and start the scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match try_install(addr) {
        Ok(()) => tracing::info!(address = %addr, "Metrics listener started"),
        Err(e) => tracing::error!(error = %e, "Failed to start metrics listener"),
    }
}

fn try_install(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .set_buckets_for_metric(
            Matcher::Full("http_request_duration_seconds".to_string()),
            LATENCY_BUCKETS,
        )?
        .set_buckets_for_metric(
            Matcher::Full("upstream_request_duration_seconds".to_string()),
            LATENCY_BUCKETS,
        )?
        .install()?;
    Ok(())
}

/// Record one completed inbound request.
pub fn record_request(method: &str, path: &str, status: u16, started: Instant) {
    histogram!(
        "http_request_duration_seconds",
        "method" => method.to_string(),
        "path" => path.to_string(),
    )
    .record(started.elapsed().as_secs_f64());
    counter!(
        "http_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string(),
    )
    .increment(1);
}

/// Record one client-path attempt by outcome. Latency is absent for shed and
/// breaker-open outcomes, which never reach the upstream.
pub fn record_outcome(outcome: Outcome, latency: Option<Duration>) {
    counter!("upstream_requests_total", "result" => outcome.as_label()).increment(1);
    if let Some(latency) = latency {
        histogram!("upstream_request_duration_seconds", "result" => outcome.as_label())
            .record(latency.as_secs_f64());
    }
}

/// Record one simulated work item by outcome label.
pub fn record_work(outcome: &'static str) {
    counter!("work_items_total", "outcome" => outcome).increment(1);
}

pub fn set_queue_depth(depth: u32) {
    gauge!("work_queue_depth").set(depth as f64);
}

pub fn set_breaker_state(state: BreakerState) {
    gauge!("circuit_breaker_state").set(state.as_gauge());
}

pub fn set_admitted(count: usize) {
    gauge!("admission_in_flight").set(count as f64);
}

pub fn inc_inflight() {
    gauge!("http_inflight_requests").increment(1.0);
}

pub fn dec_inflight() {
    gauge!("http_inflight_requests").decrement(1.0);
}
