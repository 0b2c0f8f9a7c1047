//! Request handlers.
//!
//! `/client` is the resilient path: admission control, then the circuit
//! breaker, then a bounded upstream call. `/upstream` and `/work` simulate an
//! unreliable dependency and a sheddable worker; `/healthz` reports process
//! liveness only.

use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use rand::Rng;
use serde::Deserialize;
use serde_json::json;

use crate::http::server::AppState;
use crate::observability::metrics;
use crate::resilience::Outcome;
use crate::upstream::UpstreamError;

fn default_ms() -> u64 {
    50
}

fn default_work_fail_rate() -> f64 {
    0.02
}

#[derive(Debug, Deserialize)]
pub struct ClientParams {
    #[serde(default = "default_ms")]
    pub ms: u64,
    #[serde(default)]
    pub fail_rate: f64,
    /// Per-request override of the configured upstream deadline.
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct UpstreamParams {
    #[serde(default = "default_ms")]
    pub ms: u64,
    #[serde(default)]
    pub fail_rate: f64,
}

#[derive(Debug, Deserialize)]
pub struct WorkParams {
    #[serde(default = "default_ms")]
    pub ms: u64,
    #[serde(default = "default_work_fail_rate")]
    pub fail_rate: f64,
    pub queue_depth: Option<u32>,
    pub queue_limit: Option<u32>,
}

fn bad_request(detail: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": detail }))).into_response()
}

/// Liveness probe. Reports process health only; a dependency outage must not
/// make this fail, so the breaker is deliberately not consulted.
pub async fn healthz() -> Json<serde_json::Value> {
    Json(json!({ "ok": true }))
}

/// Simulated unreliable dependency: waits `ms`, then fails with probability
/// `fail_rate`.
pub async fn upstream(Query(params): Query<UpstreamParams>) -> Response {
    if !(1..=5000).contains(&params.ms) {
        return bad_request("ms must be between 1 and 5000");
    }
    if !(0.0..=1.0).contains(&params.fail_rate) {
        return bad_request("fail_rate must be between 0 and 1");
    }

    tokio::time::sleep(Duration::from_millis(params.ms)).await;

    if rand::thread_rng().gen_bool(params.fail_rate) {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": "injected upstream failure" })),
        )
            .into_response()
    } else {
        Json(json!({ "ok": true, "ms": params.ms })).into_response()
    }
}

/// Simulated worker with synthetic queue-depth shedding.
pub async fn work(State(state): State<AppState>, Query(params): Query<WorkParams>) -> Response {
    if !(1..=2000).contains(&params.ms) {
        return bad_request("ms must be between 1 and 2000");
    }
    if !(0.0..=1.0).contains(&params.fail_rate) {
        return bad_request("fail_rate must be between 0 and 1");
    }

    let queue_depth = params
        .queue_depth
        .unwrap_or_else(|| rand::thread_rng().gen_range(0..=100));
    let queue_limit = params.queue_limit.unwrap_or(state.work_queue_limit);
    metrics::set_queue_depth(queue_depth);

    if queue_depth > queue_limit {
        metrics::record_work("shed");
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({ "error": "load shed: queue depth too high" })),
        )
            .into_response();
    }

    tokio::time::sleep(Duration::from_millis(params.ms)).await;

    if rand::thread_rng().gen_bool(params.fail_rate) {
        metrics::record_work("error");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "simulated failure" })),
        )
            .into_response();
    }

    metrics::record_work("ok");
    Json(json!({ "status": "ok", "ms": params.ms, "queue_depth": queue_depth })).into_response()
}

/// Resilient client path: admission control → circuit breaker → bounded
/// upstream call → outcome classification and feedback.
pub async fn client(State(state): State<AppState>, Query(params): Query<ClientParams>) -> Response {
    if !(1..=5000).contains(&params.ms) {
        return bad_request("ms must be between 1 and 5000");
    }
    if !(0.0..=1.0).contains(&params.fail_rate) {
        return bad_request("fail_rate must be between 0 and 1");
    }
    if let Some(timeout_ms) = params.timeout_ms {
        if !(1..=10_000).contains(&timeout_ms) {
            return bad_request("timeout_ms must be between 1 and 10000");
        }
    }
    let timeout = params
        .timeout_ms
        .map(Duration::from_millis)
        .unwrap_or_else(|| state.upstream.default_timeout());

    // Shed before anything else: no queuing, no breaker evidence.
    let Some(_permit) = state.admission.try_admit() else {
        metrics::record_outcome(Outcome::Shed, None);
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({ "error": "overloaded, request shed" })),
        )
            .into_response();
    };

    // The permit is held from here on and released on every return by Drop.
    if !state.breaker.allow() {
        metrics::record_outcome(Outcome::BreakerOpen, None);
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": "circuit breaker open" })),
        )
            .into_response();
    }

    let (latency, result) = state.upstream.call(params.ms, params.fail_rate, timeout).await;
    let outcome = match &result {
        Ok(()) => Outcome::Ok,
        Err(e) => e.outcome(),
    };
    state.breaker.report(outcome);
    metrics::record_outcome(outcome, Some(latency));

    match result {
        Ok(()) => Json(json!({
            "ok": true,
            "ms": params.ms,
            "timeout_ms": timeout.as_millis() as u64,
        }))
        .into_response(),
        Err(UpstreamError::Timeout(_)) => (
            StatusCode::GATEWAY_TIMEOUT,
            Json(json!({ "error": "upstream timeout" })),
        )
            .into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "upstream call failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({ "error": "upstream error" })),
            )
                .into_response()
        }
    }
}
