//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → AmbassadorConfig (validated, immutable)
//!     → consumed once by Ambassador::new
//! ```
//!
//! # Design Decisions
//! - Config is immutable once an ambassador is built from it
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, read_config, ConfigError};
pub use schema::{
    AdminConfig, AmbassadorConfig, CacheConfig, CircuitBreakerConfig, EndpointConfig,
    HealthCheckConfig, LoadBalancerConfig, MetricsConfig, ObservabilityConfig, PoolConfig,
    RetryConfig, TimeoutConfig,
};
pub use validation::{validate_config, ValidationError};
