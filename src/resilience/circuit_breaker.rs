//! Circuit breaker for endpoint protection.
//!
//! # States
//! - Closed: normal operation, requests pass through
//! - Open: endpoint assumed down, requests fail fast
//! - Half-Open: testing if endpoint recovered
//!
//! # State Transitions
//! ```text
//! Closed → Open: failure_count >= failure_threshold
//! Open → Half-Open: first eligibility check at or after next_attempt_at
//! Half-Open → Closed: success_threshold consecutive successes
//! Half-Open → Open: any failure
//! ```
//!
//! # Design Decisions
//! - Per-endpoint circuit breaker (not global)
//! - Open → Half-Open is lazy; no timers, the check happens at selection
//! - A success while closed decays the failure count by one instead of
//!   clearing it, so intermittent failures still accumulate
//! - Pure state machine: callers pass `now`, nothing here can fail

use serde::Serialize;
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;

use crate::clock::deadline_after;
use crate::config::CircuitBreakerConfig;

/// Breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        }
    }
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Thresholds shared by every breaker of one ambassador.
#[derive(Debug, Clone)]
pub struct BreakerSettings {
    pub failure_threshold: u32,
    pub success_threshold: u32,
    pub open_timeout: Duration,
}

impl From<&CircuitBreakerConfig> for BreakerSettings {
    fn from(config: &CircuitBreakerConfig) -> Self {
        Self {
            failure_threshold: config.failure_threshold,
            success_threshold: config.success_threshold,
            open_timeout: config.open_timeout(),
        }
    }
}

impl Default for BreakerSettings {
    fn default() -> Self {
        Self::from(&CircuitBreakerConfig::default())
    }
}

/// Failure-detection state machine for one endpoint.
#[derive(Debug, Clone)]
pub struct CircuitBreaker {
    settings: BreakerSettings,
    state: CircuitState,
    failure_count: u32,
    success_count: u32,
    next_attempt_at: Option<Instant>,
}

impl CircuitBreaker {
    pub fn new(settings: BreakerSettings) -> Self {
        Self {
            settings,
            state: CircuitState::Closed,
            failure_count: 0,
            success_count: 0,
            next_attempt_at: None,
        }
    }

    pub fn state(&self) -> CircuitState {
        self.state
    }

    pub fn failure_count(&self) -> u32 {
        self.failure_count
    }

    pub fn success_count(&self) -> u32 {
        self.success_count
    }

    /// When an open breaker will next admit a trial request.
    pub fn next_attempt_at(&self) -> Option<Instant> {
        self.next_attempt_at
    }

    /// Time left before an open breaker admits traffic again.
    pub fn remaining_open(&self, now: Instant) -> Option<Duration> {
        match (self.state, self.next_attempt_at) {
            (CircuitState::Open, Some(at)) => Some(at.saturating_duration_since(now)),
            _ => None,
        }
    }

    /// Whether the endpoint may receive traffic now.
    ///
    /// An open breaker whose timeout has elapsed flips to half-open here.
    pub fn is_eligible(&mut self, now: Instant) -> bool {
        match self.state {
            CircuitState::Closed | CircuitState::HalfOpen => true,
            CircuitState::Open => match self.next_attempt_at {
                Some(at) if now >= at => {
                    self.state = CircuitState::HalfOpen;
                    self.success_count = 0;
                    true
                }
                _ => false,
            },
        }
    }

    /// Record a successful call. Returns the new state on a transition.
    pub fn on_success(&mut self) -> Option<CircuitState> {
        match self.state {
            CircuitState::Closed => {
                self.failure_count = self.failure_count.saturating_sub(1);
                None
            }
            CircuitState::HalfOpen => {
                self.success_count += 1;
                if self.success_count >= self.settings.success_threshold {
                    self.close();
                    Some(CircuitState::Closed)
                } else {
                    None
                }
            }
            // A call that started before the circuit opened; the open window stands.
            CircuitState::Open => None,
        }
    }

    /// Record a failed call. Returns the new state on a transition.
    pub fn on_failure(&mut self, now: Instant) -> Option<CircuitState> {
        self.failure_count = self.failure_count.saturating_add(1);
        match self.state {
            CircuitState::Closed if self.failure_count >= self.settings.failure_threshold => {
                self.open(now);
                Some(CircuitState::Open)
            }
            CircuitState::HalfOpen => {
                self.open(now);
                Some(CircuitState::Open)
            }
            _ => None,
        }
    }

    /// Force the breaker closed.
    pub fn reset(&mut self) {
        self.close();
    }

    fn open(&mut self, now: Instant) {
        self.state = CircuitState::Open;
        self.success_count = 0;
        self.next_attempt_at = Some(deadline_after(now, self.settings.open_timeout));
    }

    fn close(&mut self) {
        self.state = CircuitState::Closed;
        self.failure_count = 0;
        self.success_count = 0;
        self.next_attempt_at = None;
    }
}
