//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): forwarded requests by method, status, service
//! - `gateway_request_duration_seconds` (histogram): forwarding latency
//! - `gateway_service_health` (gauge): 1=healthy, 0=unhealthy
//! - `gateway_health_checks_total` (counter): probes by service and outcome

use std::net::SocketAddr;
use std::time::Instant;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => {
            describe_metrics();
            tracing::info!(address = %addr, "Metrics exporter listening");
        }
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

fn describe_metrics() {
    describe_counter!("gateway_requests_total", "Requests handled by the proxy route");
    describe_histogram!("gateway_request_duration_seconds", "Proxy route latency in seconds");
    describe_gauge!("gateway_service_health", "Last known health per service (1 healthy)");
    describe_counter!("gateway_health_checks_total", "Health probes by outcome");
}

pub fn record_request(method: &str, status: u16, service: &str, start: Instant) {
    counter!(
        "gateway_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "service" => service.to_string()
    )
    .increment(1);

    histogram!(
        "gateway_request_duration_seconds",
        "method" => method.to_string(),
        "service" => service.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_service_health(service: &str, healthy: bool) {
    gauge!("gateway_service_health", "service" => service.to_string())
        .set(if healthy { 1.0 } else { 0.0 });

    counter!(
        "gateway_health_checks_total",
        "service" => service.to_string(),
        "status" => if healthy { "healthy" } else { "unhealthy" }
    )
    .increment(1);
}
