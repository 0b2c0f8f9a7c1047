//! Request-scoped metrics middleware.

use std::time::Instant;

use axum::extract::{MatchedPath, Request};
use axum::middleware::Next;
use axum::response::Response;

use crate::observability::metrics;

/// Track every inbound request: in-flight gauge while handling, then the
/// request counter and latency histogram once the response is ready.
pub async fn track_metrics(request: Request, next: Next) -> Response {
    let started = Instant::now();
    let method = request.method().to_string();
    // Label with the route template, not the raw path, to keep cardinality low.
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    metrics::inc_inflight();
    let response = next.run(request).await;
    metrics::dec_inflight();

    metrics::record_request(&method, &path, response.status().as_u16(), started);
    response
}
