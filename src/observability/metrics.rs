//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gatekeeper_requests_total` (counter): pipeline entries by route class
//! - `gatekeeper_rejections_total` (counter): terminal rejections by reason
//! - `gatekeeper_rate_limit_buckets` (gauge): live identifier buckets
//!
//! # Design Decisions
//! - Low-overhead updates (atomic increments behind the metrics facade)
//! - Prometheus exporter is optional and binds its own address

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on the given address.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter started"),
        Err(e) => tracing::error!(error = %e, "Failed to start metrics exporter"),
    }
}

/// Record a request entering the pipeline.
pub fn record_request(route_class: &'static str) {
    metrics::counter!("gatekeeper_requests_total", "route" => route_class).increment(1);
}

/// Record a terminal rejection at the gatekeeping layer.
pub fn record_rejection(reason: &'static str) {
    metrics::counter!("gatekeeper_rejections_total", "reason" => reason).increment(1);
}

/// Record the current number of live rate-limit buckets.
pub fn record_bucket_count(count: usize) {
    metrics::gauge!("gatekeeper_rate_limit_buckets").set(count as f64);
}
