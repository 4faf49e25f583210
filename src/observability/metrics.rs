//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Mirror ambassador events into the `metrics` facade
//! - Expose a Prometheus-compatible scrape endpoint
//!
//! # Metrics
//! - `ambassador_attempts_total` (counter): attempts by endpoint, outcome
//! - `ambassador_attempt_duration_seconds` (histogram): attempt latency by endpoint
//! - `ambassador_retries_total` (counter): attempts that were retries
//! - `ambassador_circuit_rejections_total` (counter): attempts with no eligible endpoint
//! - `ambassador_pool_exhausted_total` (counter): attempts refused by the pool
//! - `ambassador_endpoint_healthy` (gauge): 1=healthy, 0=unhealthy
//! - `ambassador_circuit_transitions_total` (counter): breaker transitions by target state
//! - `ambassador_cache_lookups_total` (counter): cache lookups by result

use ::metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Duration;

use crate::resilience::CircuitState;

/// Install the Prometheus recorder with its own HTTP listener.
/// Must be called from within a tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Prometheus exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install Prometheus exporter"),
    }
}

/// One finished attempt against an endpoint.
pub fn record_attempt(endpoint: &str, outcome: &'static str, latency: Duration) {
    counter!(
        "ambassador_attempts_total",
        "endpoint" => endpoint.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    histogram!("ambassador_attempt_duration_seconds", "endpoint" => endpoint.to_string())
        .record(latency.as_secs_f64());
}

pub fn record_retry() {
    counter!("ambassador_retries_total").increment(1);
}

pub fn record_circuit_rejection() {
    counter!("ambassador_circuit_rejections_total").increment(1);
}

pub fn record_pool_exhausted() {
    counter!("ambassador_pool_exhausted_total").increment(1);
}

pub fn record_endpoint_health(endpoint: &str, healthy: bool) {
    gauge!("ambassador_endpoint_healthy", "endpoint" => endpoint.to_string())
        .set(if healthy { 1.0 } else { 0.0 });
}

pub fn record_circuit_transition(endpoint: &str, to: CircuitState) {
    counter!(
        "ambassador_circuit_transitions_total",
        "endpoint" => endpoint.to_string(),
        "to" => to.as_str()
    )
    .increment(1);
}

pub fn record_cache_lookup(hit: bool) {
    counter!(
        "ambassador_cache_lookups_total",
        "result" => if hit { "hit" } else { "miss" }
    )
    .increment(1);
}
