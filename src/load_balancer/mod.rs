//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Ambassador attempt
//!     → registry.rs (lock, filter endpoints through their breakers)
//!     → Apply load balancing algorithm:
//!         - round_robin.rs (rotate through endpoints)
//!         - least_conn.rs (pick endpoint with fewest connections)
//!         - weighted_random.rs (deprioritize flaky endpoints)
//!         - least_response_time.rs (pick the fastest endpoint)
//!     → endpoint.rs (bump active connections, hand back a guard)
//! ```
//!
//! # Design Decisions
//! - Algorithms only read endpoint state; the registry does all mutation
//! - Selection runs under the registry lock, so it sees a consistent view
//! - Ties go to the earliest-registered endpoint

pub mod endpoint;
pub mod least_conn;
pub mod least_response_time;
pub mod registry;
pub mod round_robin;
pub mod weighted_random;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::LoadBalancerConfig;
use self::endpoint::Endpoint;
use self::least_conn::LeastConnections;
use self::least_response_time::LeastResponseTime;
use self::round_robin::RoundRobin;
use self::weighted_random::WeightedRandom;

pub use endpoint::EndpointStatus;
pub use registry::{EndpointRegistry, Selection};

/// Picks one endpoint out of the currently eligible ones.
pub trait LoadBalancer: Send + Sync + fmt::Debug {
    /// `eligible` is in registration order. Returns `None` only when it is empty.
    fn select<'a>(&self, eligible: &[&'a Endpoint]) -> Option<&'a Endpoint>;

    fn strategy(&self) -> Strategy;
}

/// Available selection strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    #[default]
    RoundRobin,
    LeastConnections,
    WeightedRandom,
    LeastResponseTime,
}

/// Build the configured load balancer.
pub fn build_balancer(config: &LoadBalancerConfig) -> Box<dyn LoadBalancer> {
    match config.strategy {
        Strategy::RoundRobin => Box::new(RoundRobin::new()),
        Strategy::LeastConnections => Box::new(LeastConnections::new()),
        Strategy::WeightedRandom => Box::new(WeightedRandom::new(config.weight_floor, config.weight_ceiling)),
        Strategy::LeastResponseTime => Box::new(LeastResponseTime::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_matches_strategy() {
        for strategy in [
            Strategy::RoundRobin,
            Strategy::LeastConnections,
            Strategy::WeightedRandom,
            Strategy::LeastResponseTime,
        ] {
            let config = LoadBalancerConfig {
                strategy,
                ..LoadBalancerConfig::default()
            };
            assert_eq!(build_balancer(&config).strategy(), strategy);
        }
    }
}
