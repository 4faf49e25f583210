//! Resilient remote-call ambassador.
//!
//! Routes calls to a set of equivalent remote endpoints with per-endpoint
//! circuit breakers, pluggable load balancing, a bounded connection pool,
//! retries with jittered backoff and per-call metrics.

pub mod admin;
pub mod ambassador;
pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod health;
pub mod lifecycle;
pub mod load_balancer;
pub mod net;
pub mod observability;
pub mod resilience;

pub use ambassador::{Ambassador, CachingCaller, LoggingCaller, RemoteCaller};
pub use cache::ResponseCache;
pub use clock::{Clock, ManualClock, TokioClock};
pub use config::AmbassadorConfig;
pub use error::{AmbassadorError, AmbassadorResult, OperationError};
pub use lifecycle::Shutdown;
pub use load_balancer::{EndpointStatus, Strategy};
pub use observability::MetricsSnapshot;
pub use resilience::CircuitState;
