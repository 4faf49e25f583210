//! In-process call metrics.
//!
//! Counts every attempt the ambassador makes and keeps a window of the most
//! recent successful latencies for the average. Totals only ever grow.

use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Result of one attempt, as far as the collector cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Failure => "failure",
        }
    }
}

/// Point-in-time copy of the collector.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub successes: u64,
    pub failures: u64,
    pub retries: u64,
    pub circuit_rejections: u64,
    /// `successes / total_requests`, 0.0 before the first request.
    pub success_rate: f64,
    /// Mean of the latency window, 0.0 when empty.
    pub average_latency_ms: f64,
    pub latency_samples: usize,
}

#[derive(Debug, Default)]
struct Counters {
    total_requests: u64,
    successes: u64,
    failures: u64,
    retries: u64,
    circuit_rejections: u64,
    latencies: VecDeque<Duration>,
}

/// Thread-safe attempt counters with a bounded latency window.
#[derive(Debug)]
pub struct MetricsCollector {
    window: usize,
    inner: Mutex<Counters>,
}

impl MetricsCollector {
    pub fn new(window: usize) -> Self {
        Self {
            window: window.max(1),
            inner: Mutex::new(Counters::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Counters> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record one attempt. `retried` marks attempts after the first.
    pub fn record(&self, outcome: Outcome, latency: Duration, retried: bool) {
        let mut c = self.lock();
        c.total_requests += 1;
        if retried {
            c.retries += 1;
        }
        match outcome {
            Outcome::Success => {
                c.successes += 1;
                if c.latencies.len() == self.window {
                    c.latencies.pop_front();
                }
                c.latencies.push_back(latency);
            }
            Outcome::Failure => c.failures += 1,
        }
    }

    /// An attempt that found no eligible endpoint. Counts as a failed attempt.
    pub fn record_rejection(&self, retried: bool) {
        let mut c = self.lock();
        c.total_requests += 1;
        c.failures += 1;
        c.circuit_rejections += 1;
        if retried {
            c.retries += 1;
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let c = self.lock();
        let success_rate = if c.total_requests == 0 {
            0.0
        } else {
            c.successes as f64 / c.total_requests as f64
        };
        let average_latency_ms = if c.latencies.is_empty() {
            0.0
        } else {
            let sum: Duration = c.latencies.iter().sum();
            sum.as_micros() as f64 / 1000.0 / c.latencies.len() as f64
        };

        MetricsSnapshot {
            total_requests: c.total_requests,
            successes: c.successes,
            failures: c.failures,
            retries: c.retries,
            circuit_rejections: c.circuit_rejections,
            success_rate,
            average_latency_ms,
            latency_samples: c.latencies.len(),
        }
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new(100)
    }
}
