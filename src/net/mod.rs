//! Connection pooling subsystem.
//!
//! # Data Flow
//! ```text
//! Ambassador attempt
//!     → pool.rs (acquire: reuse idle, create, or reject)
//!     → connection.rs (handle marked in use)
//!     → remote operation runs
//!     → PooledConnection dropped (handle marked idle, waiter woken)
//!
//! Handle States:
//!     Created(in use) → Idle → In use → ... → Evicted (stale)
//! ```
//!
//! # Design Decisions
//! - One pool is shared across all endpoints
//! - Capacity is a hard cap on live handles, idle or not
//! - Stale idle handles are evicted lazily on acquire and by explicit cleanup

pub mod connection;
pub mod pool;

pub use connection::{ConnectionHandle, ConnectionId};
pub use pool::{ConnectionPool, PoolError, PoolSettings, PoolStats, PooledConnection};
