//! Metrics collection and exposition.
//!
//! # Metrics
//! - `traceline_requests_total` (counter): handled requests by route, status
//! - `traceline_upstream_requests_total` (counter): outbound calls by
//!   service, status (status 0 = transport failure or timeout)
//! - `traceline_pool_jobs_total` (counter): pool submissions by outcome

use std::net::SocketAddr;

use metrics::{counter, describe_counter};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on `addr`.
///
/// Failure to bind is logged, not fatal; the process runs without the
/// scrape endpoint and every recorder call becomes a no-op.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => {
            describe_counter!(
                "traceline_requests_total",
                "Handled HTTP requests by route and status"
            );
            describe_counter!(
                "traceline_upstream_requests_total",
                "Outbound HTTP calls by service and status"
            );
            describe_counter!(
                "traceline_pool_jobs_total",
                "Worker-pool submissions by outcome"
            );
            tracing::info!(address = %addr, "metrics exporter listening");
        }
        Err(e) => {
            tracing::error!(error = %e, address = %addr, "failed to install metrics exporter");
        }
    }
}

pub fn record_request(route: &'static str, status: u16) {
    counter!(
        "traceline_requests_total",
        "route" => route,
        "status" => status.to_string()
    )
    .increment(1);
}

pub fn record_upstream_request(service: &str, status: u16) {
    counter!(
        "traceline_upstream_requests_total",
        "service" => service.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

pub fn record_pool_submission() {
    counter!("traceline_pool_jobs_total", "outcome" => "accepted").increment(1);
}

pub fn record_pool_rejection() {
    counter!("traceline_pool_jobs_total", "outcome" => "rejected").increment(1);
}
