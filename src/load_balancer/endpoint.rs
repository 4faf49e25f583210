//! Endpoint abstraction.
//!
//! # Responsibilities
//! - Represent a single remote endpoint
//! - Track active connections (for Least Connections LB)
//! - Track last response time (for Least Response Time LB)
//! - Own the endpoint's circuit breaker

use serde::Serialize;
use std::time::Duration;
use tokio::time::Instant;

use crate::resilience::{BreakerSettings, CircuitBreaker, CircuitState};

/// A single remote endpoint.
///
/// Only ever touched through the registry lock.
#[derive(Debug)]
pub struct Endpoint {
    /// Registration index.
    id: usize,
    name: String,
    address: String,
    /// False while the breaker is open.
    healthy: bool,
    last_check: Option<Instant>,
    last_response_time: Duration,
    active_connections: usize,
    breaker: CircuitBreaker,
}

impl Endpoint {
    /// Create a new endpoint with a closed breaker.
    pub fn new(id: usize, name: impl Into<String>, address: impl Into<String>, breaker: BreakerSettings) -> Self {
        Self {
            id,
            name: name.into(),
            address: address.into(),
            healthy: true,
            last_check: None,
            last_response_time: Duration::ZERO,
            active_connections: 0,
            breaker: CircuitBreaker::new(breaker),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn last_check(&self) -> Option<Instant> {
        self.last_check
    }

    pub fn last_response_time(&self) -> Duration {
        self.last_response_time
    }

    /// Get the current number of active connections.
    pub fn active_connections(&self) -> usize {
        self.active_connections
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.breaker.failure_count()
    }

    pub fn circuit_state(&self) -> CircuitState {
        self.breaker.state()
    }

    /// Increment active connection count.
    pub fn inc_connections(&mut self) {
        self.active_connections += 1;
    }

    /// Decrement active connection count.
    pub fn dec_connections(&mut self) {
        self.active_connections = self.active_connections.saturating_sub(1);
    }

    pub fn record_response_time(&mut self, latency: Duration) {
        self.last_response_time = latency;
    }

    pub(crate) fn mark_checked(&mut self, at: Instant) {
        self.last_check = Some(at);
    }

    pub(crate) fn set_healthy(&mut self, healthy: bool) {
        self.healthy = healthy;
    }

    pub(crate) fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    pub(crate) fn breaker_mut(&mut self) -> &mut CircuitBreaker {
        &mut self.breaker
    }

    /// Point-in-time copy for reporting.
    pub fn status(&self, now: Instant) -> EndpointStatus {
        EndpointStatus {
            name: self.name.clone(),
            address: self.address.clone(),
            healthy: self.healthy,
            circuit_state: self.breaker.state(),
            consecutive_failures: self.breaker.failure_count(),
            half_open_successes: self.breaker.success_count(),
            active_connections: self.active_connections,
            last_response_time_ms: self.last_response_time.as_micros() as f64 / 1000.0,
            last_check_ago_ms: self
                .last_check
                .map(|at| now.saturating_duration_since(at).as_millis() as u64),
            retry_after_ms: self
                .breaker
                .remaining_open(now)
                .map(|d| d.as_millis() as u64),
        }
    }
}

/// Health and statistics of one endpoint, as reported to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndpointStatus {
    pub name: String,
    pub address: String,
    pub healthy: bool,
    pub circuit_state: CircuitState,
    pub consecutive_failures: u32,
    /// Trial successes so far while half-open.
    pub half_open_successes: u32,
    pub active_connections: usize,
    pub last_response_time_ms: f64,
    pub last_check_ago_ms: Option<u64>,
    /// Set while the circuit is open.
    pub retry_after_ms: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_counting_saturates() {
        let mut ep = Endpoint::new(0, "a", "127.0.0.1:1", BreakerSettings::default());
        ep.inc_connections();
        ep.inc_connections();
        assert_eq!(ep.active_connections(), 2);
        ep.dec_connections();
        ep.dec_connections();
        ep.dec_connections();
        assert_eq!(ep.active_connections(), 0);
    }

    #[test]
    fn test_status_snapshot() {
        let now = Instant::now();
        let mut ep = Endpoint::new(3, "a", "127.0.0.1:1", BreakerSettings::default());
        ep.record_response_time(Duration::from_millis(12));
        ep.mark_checked(now);

        let status = ep.status(now + Duration::from_millis(40));
        assert_eq!(status.name, "a");
        assert!(status.healthy);
        assert_eq!(status.circuit_state, CircuitState::Closed);
        assert_eq!(status.last_response_time_ms, 12.0);
        assert_eq!(status.last_check_ago_ms, Some(40));
        assert_eq!(status.retry_after_ms, None);
        assert_eq!(status.half_open_successes, 0);
    }
}
