//! Active health checking.
//!
//! # Responsibilities
//! - Periodically probe endpoints
//! - Feed probe results into the endpoint breakers

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

use crate::ambassador::Ambassador;
use crate::config::HealthCheckConfig;
use crate::error::{AmbassadorError, OperationError};

pub struct HealthMonitor<P> {
    ambassador: Arc<Ambassador>,
    probe: P,
    interval: Duration,
    timeout: Duration,
}

impl<P, Fut> HealthMonitor<P>
where
    P: Fn(String) -> Fut,
    Fut: Future<Output = Result<(), OperationError>>,
{
    /// `probe` receives an endpoint address and reports whether it answered.
    pub fn new(ambassador: Arc<Ambassador>, config: &HealthCheckConfig, probe: P) -> Self {
        Self {
            ambassador,
            probe,
            interval: Duration::from_secs(config.interval_secs),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    pub async fn run(self, shutdown: CancellationToken) {
        tracing::info!(interval = ?self.interval, timeout = ?self.timeout, "Health monitor starting");

        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.check_all().await;
                }
                _ = shutdown.cancelled() => {
                    tracing::info!("Health monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// Probe every eligible endpoint once. Returns how many answered.
    pub async fn check_all(&self) -> usize {
        let registry = self.ambassador.registry();
        let mut healthy = 0;

        for (id, name, address) in registry.probe_targets() {
            let started = Instant::now();
            let outcome = match time::timeout(self.timeout, (self.probe)(address.clone())).await {
                Ok(Ok(())) => Ok(started.elapsed()),
                Ok(Err(e)) => {
                    tracing::warn!(endpoint = %name, address = %address, error = %e, "Health check failed");
                    Err(AmbassadorError::Operation(e))
                }
                Err(_) => {
                    tracing::warn!(endpoint = %name, address = %address, "Health check failed: timeout");
                    Err(AmbassadorError::Timeout(self.timeout))
                }
            };

            if outcome.is_ok() {
                healthy += 1;
            }
            registry.record_probe(id, outcome);
        }

        tracing::debug!(healthy, "Health check round complete");
        healthy
    }
}
