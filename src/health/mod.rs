//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Passive (ambassador.rs):
//!     Real traffic outcome
//!     → breaker on_success / on_failure
//!
//! Active (active.rs):
//!     Periodic timer
//!     → probe each endpoint whose breaker admits traffic
//!     → same breaker update as real traffic, plus last_check stamp
//! ```
//!
//! # Design Decisions
//! - Active and passive checks feed one breaker per endpoint
//! - Open endpoints are not probed; their timeout governs recovery
//! - The probe is caller-supplied, so any protocol can be checked

pub mod active;

pub use active::HealthMonitor;
