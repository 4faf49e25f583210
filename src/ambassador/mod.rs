//! Ambassador orchestrator.
//!
//! # Data Flow
//! ```text
//! execute(name, operation)
//!     → request span (request_id)
//!     → RetryPolicy loop, per attempt:
//!         → EndpointRegistry::select (breaker eligibility, recovery sweep, strategy)
//!         → ConnectionPool::acquire (raced against the cancel token)
//!         → operation(address) under attempt timeout
//!         → breaker + metrics updated with the outcome
//!         → guards drop (handle released, active connection decremented)
//!     → value, or RetriesExhausted / Cancelled
//! ```
//!
//! # Design Decisions
//! - Every attempt re-selects, so a retry can land on a different endpoint
//! - No lock is held while the operation runs or while backing off
//! - Cancellation is never recorded against an endpoint
//! - The endpoint's active connection count rises at selection, before the
//!   pool wait; an attempt parked on a full pool already counts against its
//!   endpoint for least-connections

pub mod caller;
pub mod decorators;

pub use caller::RemoteCaller;
pub use decorators::{CachingCaller, LoggingCaller};

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::clock::{Clock, TokioClock};
use crate::config::{validate_config, AmbassadorConfig};
use crate::error::{AmbassadorError, AmbassadorResult, OperationError};
use crate::load_balancer::{build_balancer, EndpointRegistry, EndpointStatus};
use crate::net::{ConnectionPool, PoolSettings, PoolStats};
use crate::observability::{metrics, spans, MetricsCollector, MetricsSnapshot, Outcome};
use crate::resilience::{timeouts::run_with_timeout, BreakerSettings, RetryPolicy};

/// Resilient proxy for calls to a set of equivalent remote endpoints.
#[derive(Debug)]
pub struct Ambassador {
    registry: EndpointRegistry,
    pool: ConnectionPool,
    retry: RetryPolicy,
    metrics: MetricsCollector,
    attempt_timeout: Duration,
}

impl Ambassador {
    /// Build an ambassador on the tokio clock.
    pub fn new(config: &AmbassadorConfig) -> AmbassadorResult<Self> {
        Self::with_clock(config, Arc::new(TokioClock))
    }

    /// Build an ambassador whose breakers and pool read time from `clock`.
    pub fn with_clock(config: &AmbassadorConfig, clock: Arc<dyn Clock>) -> AmbassadorResult<Self> {
        validate_config(config).map_err(|errors| {
            let joined = errors.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ");
            AmbassadorError::InvalidConfiguration(joined)
        })?;

        let registry = EndpointRegistry::new(
            &config.endpoints,
            BreakerSettings::from(&config.circuit_breaker),
            build_balancer(&config.load_balancer),
            clock.clone(),
        )?;

        tracing::info!(
            endpoints = config.endpoints.len(),
            strategy = ?config.load_balancer.strategy,
            max_retries = config.retry.max_retries,
            max_connections = config.pool.max_connections,
            "Ambassador ready"
        );

        Ok(Self {
            registry,
            pool: ConnectionPool::new(PoolSettings::from(&config.pool), clock),
            retry: RetryPolicy::from(&config.retry),
            metrics: MetricsCollector::new(config.metrics.latency_window),
            attempt_timeout: config.timeouts.attempt(),
        })
    }

    /// Run `operation` against a healthy endpoint, retrying on failure.
    ///
    /// The operation receives the selected endpoint's address.
    pub async fn execute<T, F, Fut>(&self, name: &str, operation: F) -> AmbassadorResult<T>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = Result<T, OperationError>>,
    {
        self.execute_with_cancel(name, operation, &CancellationToken::new()).await
    }

    /// Like [`execute`](Self::execute); `cancel` aborts the in-flight attempt
    /// and any pending backoff with [`AmbassadorError::Cancelled`].
    pub async fn execute_with_cancel<T, F, Fut>(
        &self,
        name: &str,
        operation: F,
        cancel: &CancellationToken,
    ) -> AmbassadorResult<T>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = Result<T, OperationError>>,
    {
        let operation = &operation;
        async move {
            let result = self
                .retry
                .execute_with_cancel(move |attempt| self.attempt_once(operation, attempt, cancel), cancel)
                .await;

            match &result {
                Ok(_) => tracing::debug!("Call succeeded"),
                Err(AmbassadorError::Cancelled) => tracing::info!("Call cancelled"),
                Err(err) => tracing::error!(attempts = ?err.attempts(), error = %err, "Call failed"),
            }
            result
        }
        .instrument(spans::request_span(name))
        .await
    }

    /// Like [`execute`](Self::execute), but a spent retry budget yields
    /// `fallback(error)` instead of an error. Cancellation still propagates.
    pub async fn execute_with_fallback<T, F, Fut, G>(&self, name: &str, operation: F, fallback: G) -> AmbassadorResult<T>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = Result<T, OperationError>>,
        G: FnOnce(&AmbassadorError) -> T,
    {
        match self.execute(name, operation).await {
            Err(err @ AmbassadorError::RetriesExhausted { .. }) => {
                tracing::warn!(operation = %name, error = %err, "Falling back");
                Ok(fallback(&err))
            }
            other => other,
        }
    }

    async fn attempt_once<T, F, Fut>(&self, operation: &F, attempt: u32, cancel: &CancellationToken) -> AmbassadorResult<T>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = Result<T, OperationError>>,
    {
        let retried = attempt > 1;
        if retried {
            metrics::record_retry();
        }

        let selection = match self.registry.select() {
            Ok(selection) => selection,
            Err(err) => {
                tracing::warn!(attempt, "No eligible endpoint");
                self.metrics.record_rejection(retried);
                metrics::record_circuit_rejection();
                return Err(err);
            }
        };

        let acquired = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(AmbassadorError::Cancelled),
            acquired = self.pool.acquire() => acquired,
        };
        let _connection = match acquired {
            Ok(connection) => connection,
            Err(err) => {
                self.metrics.record(Outcome::Failure, Duration::ZERO, retried);
                metrics::record_pool_exhausted();
                return Err(err.into());
            }
        };

        tracing::debug!(attempt, endpoint = %selection.name(), address = %selection.address(), "Dispatching attempt");

        let started = Instant::now();
        let result = run_with_timeout(self.attempt_timeout, cancel, operation(selection.address().to_string())).await;
        let latency = started.elapsed();

        match &result {
            Ok(_) => {
                self.registry.record_success(selection.id(), latency);
                self.metrics.record(Outcome::Success, latency, retried);
                metrics::record_attempt(selection.name(), Outcome::Success.as_str(), latency);
            }
            Err(AmbassadorError::Cancelled) => {}
            Err(err) => {
                tracing::warn!(attempt, endpoint = %selection.name(), error = %err, "Attempt failed");
                self.registry.record_failure(selection.id(), err);
                self.metrics.record(Outcome::Failure, latency, retried);
                metrics::record_attempt(selection.name(), Outcome::Failure.as_str(), latency);
            }
        }

        result
    }

    /// Copy of every endpoint's health, breaker and load figures.
    pub fn endpoint_status(&self) -> Vec<EndpointStatus> {
        self.registry.status()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }

    /// Force-close the named endpoint's breaker. `false` if no such endpoint.
    pub fn reset_endpoint(&self, name: &str) -> bool {
        let found = self.registry.reset(name);
        if found {
            tracing::info!(endpoint = %name, "Endpoint reset by operator");
        }
        found
    }

    /// Evict idle pooled connections past their idle limit.
    pub fn cleanup_idle_connections(&self) -> usize {
        self.pool.cleanup()
    }

    pub(crate) fn registry(&self) -> &EndpointRegistry {
        &self.registry
    }
}
