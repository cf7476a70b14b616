//! Metrics collection and exposition.
//!
//! # Metrics
//! - `adapter_requests_total` (counter): requests by method and status
//! - `adapter_request_duration_seconds` (histogram): end-to-end latency
//! - `adapter_handler_errors_total` (counter): handler-reported errors
//!
//! Recording is a no-op until [`init_metrics`] installs a recorder.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Count a finished request and record its latency.
pub fn record_request(method: &str, status: u16, start_time: Instant) {
    ::metrics::counter!(
        "adapter_requests_total",
        "method" => method_label(method),
        "status" => status.to_string()
    )
    .increment(1);
    ::metrics::histogram!("adapter_request_duration_seconds")
        .record(start_time.elapsed().as_secs_f64());
}

/// Count a handler that returned an error.
pub fn record_handler_error() {
    ::metrics::counter!("adapter_handler_errors_total").increment(1);
}

/// Standard methods keep their name; extension methods share `OTHER`.
fn method_label(method: &str) -> &'static str {
    match method {
        "GET" => "GET",
        "HEAD" => "HEAD",
        "POST" => "POST",
        "PUT" => "PUT",
        "DELETE" => "DELETE",
        "CONNECT" => "CONNECT",
        "OPTIONS" => "OPTIONS",
        "TRACE" => "TRACE",
        "PATCH" => "PATCH",
        _ => "OTHER",
    }
}
