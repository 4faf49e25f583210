//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Call through the ambassador:
//!     → retries.rs (loop up to max_retries + 1, backoff.rs between attempts)
//!     → circuit_breaker.rs (gate endpoint eligibility, track outcomes)
//!     → timeouts.rs (enforce per-attempt deadline and cancellation)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every attempt has a deadline
//! - Only retryable errors are retried; permanent failures stop the loop
//! - Circuit breaker prevents cascading failures
//! - Breakers and policies never fail the caller; they only keep books

pub mod backoff;
pub mod circuit_breaker;
pub mod retries;
pub mod timeouts;

pub use circuit_breaker::{BreakerSettings, CircuitBreaker, CircuitState};
pub use retries::RetryPolicy;
