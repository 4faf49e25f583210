//! Endpoint registry.
//!
//! # Responsibilities
//! - Own every endpoint and its breaker behind one coarse lock
//! - Filter eligible endpoints and apply the load balancing algorithm
//! - Apply attempt outcomes to breakers and endpoint statistics
//! - Provide connection guards for tracking
//!
//! The lock is held only for bookkeeping, never across a remote call.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

use crate::clock::Clock;
use crate::config::EndpointConfig;
use crate::error::{AmbassadorError, AmbassadorResult};
use crate::load_balancer::{
    endpoint::{Endpoint, EndpointStatus},
    LoadBalancer,
};
use crate::observability::metrics;
use crate::resilience::{BreakerSettings, CircuitState};

/// Owns the endpoint list and serializes all access to it.
#[derive(Debug)]
pub struct EndpointRegistry {
    endpoints: Mutex<Vec<Endpoint>>,
    balancer: Box<dyn LoadBalancer>,
    clock: Arc<dyn Clock>,
}

impl EndpointRegistry {
    /// Create a registry from configuration. The endpoint list must not be empty.
    pub fn new(
        configs: &[EndpointConfig],
        breaker: BreakerSettings,
        balancer: Box<dyn LoadBalancer>,
        clock: Arc<dyn Clock>,
    ) -> AmbassadorResult<Self> {
        if configs.is_empty() {
            return Err(AmbassadorError::InvalidConfiguration(
                "endpoint list must not be empty".to_string(),
            ));
        }

        let endpoints = configs
            .iter()
            .enumerate()
            .map(|(id, c)| Endpoint::new(id, c.name.clone(), c.address.clone(), breaker.clone()))
            .collect();

        Ok(Self {
            endpoints: Mutex::new(endpoints),
            balancer,
            clock,
        })
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Endpoint>> {
        self.endpoints.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Pick an endpoint for one attempt.
    ///
    /// The returned guard counts as an active connection on the endpoint
    /// until dropped.
    pub fn select(&self) -> AmbassadorResult<Selection<'_>> {
        let mut endpoints = self.lock();

        let mut eligible = eligible_ids(&mut endpoints, self.clock.now());
        if eligible.is_empty() {
            tracing::debug!("No eligible endpoints, running recovery sweep");
            recovery_sweep_locked(&mut endpoints, self.clock.now());
            eligible = eligible_ids(&mut endpoints, self.clock.now());
        }

        let candidates: Vec<&Endpoint> = eligible.iter().map(|&i| &endpoints[i]).collect();
        let chosen = match self.balancer.select(&candidates) {
            Some(endpoint) => endpoint.id(),
            None => {
                tracing::debug!(endpoint_count = endpoints.len(), "No healthy endpoints found");
                for e in endpoints.iter() {
                    tracing::debug!(endpoint = %e.name(), state = %e.circuit_state(), "Endpoint status");
                }
                return Err(AmbassadorError::NoHealthyEndpoints);
            }
        };

        let endpoint = &mut endpoints[chosen];
        endpoint.inc_connections();

        Ok(Selection {
            registry: self,
            id: chosen,
            name: endpoint.name().to_string(),
            address: endpoint.address().to_string(),
        })
    }

    /// Force every open breaker to re-check its timeout.
    ///
    /// Returns how many endpoints became eligible again.
    pub fn recovery_sweep(&self) -> usize {
        let mut endpoints = self.lock();
        recovery_sweep_locked(&mut endpoints, self.clock.now())
    }

    /// Apply a successful attempt to the endpoint.
    pub fn record_success(&self, id: usize, latency: Duration) {
        let mut endpoints = self.lock();
        let Some(endpoint) = endpoints.get_mut(id) else {
            return;
        };

        endpoint.record_response_time(latency);
        if let Some(to) = endpoint.breaker_mut().on_success() {
            note_transition(endpoint, to);
        }
    }

    /// Apply a failed attempt to the endpoint.
    pub fn record_failure(&self, id: usize, error: &AmbassadorError) {
        let now = self.clock.now();
        let mut endpoints = self.lock();
        let Some(endpoint) = endpoints.get_mut(id) else {
            return;
        };

        tracing::debug!(endpoint = %endpoint.name(), error = %error, "Attempt failed");
        if let Some(to) = endpoint.breaker_mut().on_failure(now) {
            note_transition(endpoint, to);
        }
    }

    /// Apply an active health probe result.
    pub fn record_probe(&self, id: usize, outcome: Result<Duration, AmbassadorError>) {
        {
            let now = self.clock.now();
            let mut endpoints = self.lock();
            if let Some(endpoint) = endpoints.get_mut(id) {
                endpoint.mark_checked(now);
            }
        }
        match outcome {
            Ok(latency) => self.record_success(id, latency),
            Err(e) => self.record_failure(id, &e),
        }
    }

    /// Endpoints a health probe may currently hit: `(id, name, address)`.
    pub fn probe_targets(&self) -> Vec<(usize, String, String)> {
        let mut endpoints = self.lock();
        let now = self.clock.now();
        eligible_ids(&mut endpoints, now)
            .into_iter()
            .map(|i| {
                let e = &endpoints[i];
                (i, e.name().to_string(), e.address().to_string())
            })
            .collect()
    }

    /// Copy of every endpoint's health and statistics.
    pub fn status(&self) -> Vec<EndpointStatus> {
        let now = self.clock.now();
        self.lock().iter().map(|e| e.status(now)).collect()
    }

    /// Force-close the breaker of the named endpoint.
    pub fn reset(&self, name: &str) -> bool {
        let mut endpoints = self.lock();
        match endpoints.iter_mut().find(|e| e.name() == name) {
            Some(endpoint) => {
                let was = endpoint.circuit_state();
                endpoint.breaker_mut().reset();
                if was != CircuitState::Closed {
                    note_transition(endpoint, CircuitState::Closed);
                }
                true
            }
            None => false,
        }
    }

    fn release_connection(&self, id: usize) {
        if let Some(endpoint) = self.lock().get_mut(id) {
            endpoint.dec_connections();
        }
    }
}

/// Indices of endpoints whose breaker admits traffic at `now`.
fn eligible_ids(endpoints: &mut [Endpoint], now: Instant) -> Vec<usize> {
    endpoints
        .iter_mut()
        .filter_map(|e| {
            let before = e.circuit_state();
            let eligible = e.breaker_mut().is_eligible(now);
            if before != e.circuit_state() {
                let to = e.circuit_state();
                note_transition(e, to);
            }
            eligible.then_some(e.id())
        })
        .collect()
}

fn recovery_sweep_locked(endpoints: &mut [Endpoint], now: Instant) -> usize {
    let mut recovered = 0;
    for endpoint in endpoints.iter_mut().filter(|e| e.circuit_state() == CircuitState::Open) {
        if endpoint.breaker_mut().is_eligible(now) {
            note_transition(endpoint, CircuitState::HalfOpen);
            recovered += 1;
        }
    }
    recovered
}

fn note_transition(endpoint: &mut Endpoint, to: CircuitState) {
    let healthy = to != CircuitState::Open;
    endpoint.set_healthy(healthy);

    match to {
        CircuitState::Open => tracing::warn!(
            endpoint = %endpoint.name(),
            failures = endpoint.consecutive_failures(),
            retry_after = ?endpoint.breaker().next_attempt_at(),
            "Circuit opened"
        ),
        CircuitState::HalfOpen => tracing::info!(endpoint = %endpoint.name(), "Circuit half-open, allowing trial traffic"),
        CircuitState::Closed => tracing::info!(endpoint = %endpoint.name(), "Circuit closed"),
    }

    metrics::record_circuit_transition(endpoint.name(), to);
    metrics::record_endpoint_health(endpoint.name(), healthy);
}

/// An endpoint chosen for one attempt.
///
/// Decrements the endpoint's active connection count when dropped.
#[derive(Debug)]
pub struct Selection<'a> {
    registry: &'a EndpointRegistry,
    id: usize,
    name: String,
    address: String,
}

impl Selection<'_> {
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> &str {
        &self.address
    }
}

impl Drop for Selection<'_> {
    fn drop(&mut self) {
        self.registry.release_connection(self.id);
    }
}
