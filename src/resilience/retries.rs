//! Retry logic.
//!
//! # Responsibilities
//! - Run an attempt closure up to `max_retries + 1` times
//! - Sleep between attempts with exponential backoff + jitter
//! - Stop early on non-retryable errors and on cancellation
//! - Wrap the last failure in `RetriesExhausted`
//!
//! # Design Decisions
//! - The policy knows nothing about endpoints; the closure re-selects one
//!   on every attempt
//! - Backoff sleeps race the cancellation token
//! - Jittered backoff prevents thundering herd

use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::config::RetryConfig;
use crate::error::{AmbassadorError, AmbassadorResult};
use crate::resilience::backoff::calculate_backoff;

/// Bounded retry with backoff. Immutable once built.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_retries: u32,
    base_delay: Duration,
    max_delay: Duration,
    use_exponential_backoff: bool,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration, max_delay: Duration, use_exponential_backoff: bool) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay,
            use_exponential_backoff,
        }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Total attempts, counting the first one.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay before retry `retry` (1-indexed).
    pub fn delay_for(&self, retry: u32) -> Duration {
        calculate_backoff(retry, self.base_delay, self.max_delay, self.use_exponential_backoff)
    }

    /// Run `attempt` until it succeeds or the budget is spent.
    ///
    /// The closure receives the 1-indexed attempt number.
    pub async fn execute<T, F, Fut>(&self, attempt: F) -> AmbassadorResult<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = AmbassadorResult<T>>,
    {
        self.execute_with_cancel(attempt, &CancellationToken::new()).await
    }

    /// Like [`execute`](Self::execute), but `cancel` aborts a pending backoff sleep.
    pub async fn execute_with_cancel<T, F, Fut>(&self, mut attempt: F, cancel: &CancellationToken) -> AmbassadorResult<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = AmbassadorResult<T>>,
    {
        let max_attempts = self.max_attempts();
        let mut attempts = 0;

        loop {
            if cancel.is_cancelled() {
                return Err(AmbassadorError::Cancelled);
            }
            attempts += 1;

            let err = match attempt(attempts).await {
                Ok(value) => return Ok(value),
                Err(AmbassadorError::Cancelled) => return Err(AmbassadorError::Cancelled),
                Err(err) => err,
            };

            if !err.is_retryable() || attempts >= max_attempts {
                return Err(AmbassadorError::RetriesExhausted {
                    attempts,
                    last_error: Box::new(err),
                });
            }

            let backoff = self.delay_for(attempts);
            tracing::info!(attempt = attempts, delay = ?backoff, error = %err, "Retrying after failure");

            tokio::select! {
                _ = cancel.cancelled() => return Err(AmbassadorError::Cancelled),
                _ = tokio::time::sleep(backoff) => {}
            }
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self::new(
            config.max_retries,
            config.base_delay(),
            config.max_delay(),
            config.use_exponential_backoff,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OperationError;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    fn policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy::new(max_retries, Duration::from_millis(100), Duration::from_secs(1), true)
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let result = policy(3)
            .execute(|n| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 3 {
                        Err(AmbassadorError::from(OperationError::transient("flaky")))
                    } else {
                        Ok(n)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_reports_attempts_and_cause() {
        let start = Instant::now();
        let err = policy(3)
            .execute(|_| async { Err::<(), _>(AmbassadorError::from(OperationError::transient("down"))) })
            .await
            .unwrap_err();

        assert_eq!(err.attempts(), Some(4));
        assert!(matches!(err.root_cause(), AmbassadorError::Operation(e) if e.message() == "down"));
        // 100 + 200 + 400 ms of backoff, each with at most 10% jitter.
        let waited = start.elapsed();
        assert!(waited >= Duration::from_millis(700));
        assert!(waited <= Duration::from_millis(770));
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_error_stops_immediately() {
        let calls = AtomicU32::new(0);
        let err = policy(5)
            .execute(|_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(AmbassadorError::from(OperationError::permanent("rejected"))) }
            })
            .await
            .unwrap_err();

        assert_eq!(err.attempts(), Some(1));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_aborts_backoff() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let slow = RetryPolicy::new(3, Duration::from_secs(10), Duration::from_secs(10), false);
        let start = Instant::now();
        let err = slow
            .execute_with_cancel(|_| async { Err::<(), _>(AmbassadorError::NoHealthyEndpoints) }, &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, AmbassadorError::Cancelled));
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_from_config() {
        let policy = RetryPolicy::from(&RetryConfig::default());
        assert_eq!(policy.max_retries(), 3);
        assert_eq!(policy.max_attempts(), 4);
    }
}
