//! Metrics collection and exposition.
//!
//! # Metrics
//! - `collector_requests_total` (counter): requests by endpoint, status
//! - `collector_request_duration_seconds` (histogram): latency by endpoint
//! - `collector_rejections_total` (counter): short-circuited requests by stage
//! - `collector_records_stored_total` (counter): records persisted
//! - `collector_cookies_stored_total` (counter): cookies persisted
//! - `collector_storage_errors_total` (counter): failed store calls by operation
//! - `collector_rate_limit_keys` (gauge): client identities currently tracked
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use axum::{body::Body, extract::MatchedPath, http::Request, middleware::Next, response::Response};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(endpoint: &str, status: u16, start: Instant) {
    metrics::counter!(
        "collector_requests_total",
        "endpoint" => endpoint.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("collector_request_duration_seconds", "endpoint" => endpoint.to_string())
        .record(start.elapsed().as_secs_f64());
}

/// A pipeline stage refused the request.
pub fn record_rejection(stage: &'static str) {
    metrics::counter!("collector_rejections_total", "stage" => stage).increment(1);
}

pub fn record_stored(cookies: usize) {
    metrics::counter!("collector_records_stored_total").increment(1);
    metrics::counter!("collector_cookies_stored_total").increment(cookies as u64);
}

pub fn record_storage_error(operation: &'static str) {
    metrics::counter!("collector_storage_errors_total", "operation" => operation).increment(1);
}

pub fn record_rate_limit_keys(count: usize) {
    metrics::gauge!("collector_rate_limit_keys").set(count as f64);
}

/// Per-request counter and latency, labelled with the matched route.
pub async fn track_requests(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let endpoint = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(request).await;
    record_request(&endpoint, response.status().as_u16(), start);
    response
}
