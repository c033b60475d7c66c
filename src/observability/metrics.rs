//! Pool metrics.
//!
//! # Metrics
//! - `h2_pool_connections` (gauge): records in the set, by target
//! - `h2_pool_eligible_connections` (gauge): active + connected records
//! - `h2_pool_evictions_total` (counter): connections reported broken
//! - `h2_pool_acquire_failures_total` (counter): acquire found nothing
//! - `h2_pool_connect_failures_total` (counter): dial failures, by phase
//! - `h2_pool_refreshes_total` (counter): DNS-driven reconciliations

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_pool_size(target: &str, total: usize, eligible: usize) {
    gauge!("h2_pool_connections", "target" => target.to_string()).set(total as f64);
    gauge!("h2_pool_eligible_connections", "target" => target.to_string()).set(eligible as f64);
}

pub fn record_eviction(target: &str) {
    counter!("h2_pool_evictions_total", "target" => target.to_string()).increment(1);
}

pub fn record_acquire_failure(target: &str) {
    counter!("h2_pool_acquire_failures_total", "target" => target.to_string()).increment(1);
}

pub fn record_connect_failures(target: &str, phase: &'static str, count: usize) {
    if count == 0 {
        return;
    }
    counter!("h2_pool_connect_failures_total", "target" => target.to_string(), "phase" => phase)
        .increment(count as u64);
}

pub fn record_refresh(target: &str) {
    counter!("h2_pool_refreshes_total", "target" => target.to_string()).increment(1);
}
