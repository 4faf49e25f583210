//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Ambassador attempts, breaker transitions, pool pressure:
//!     → collector.rs (in-process counters and latency window)
//!     → metrics.rs (metrics facade, Prometheus when installed)
//!     → logging.rs (structured log events)
//!     → spans.rs (per-call span with request ID)
//!
//! Consumers:
//!     → Ambassador::metrics() / admin API (collector snapshot)
//!     → Prometheus scrape
//!     → stdout (fmt or JSON)
//! ```
//!
//! # Design Decisions
//! - The collector is the source of truth for snapshots; the facade is a mirror
//! - Facade calls are no-ops until a recorder is installed
//! - Request ID flows through every log line of one call

pub mod collector;
pub mod logging;
pub mod metrics;
pub mod spans;

pub use collector::{MetricsCollector, MetricsSnapshot, Outcome};
