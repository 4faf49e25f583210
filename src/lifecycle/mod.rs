//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Shutdown (shutdown.rs):
//!     Ctrl-C or workload done → token cancelled
//!     → health monitor, admin server, in-flight calls stop
//! ```
//!
//! # Design Decisions
//! - One cancellation token fans out to every long-running task
//! - In-flight calls observe the same token through execute_with_cancel

pub mod shutdown;

pub use shutdown::Shutdown;
