//! Least Connections load balancing strategy.

use crate::load_balancer::{endpoint::Endpoint, LoadBalancer, Strategy};

/// Least connections selector.
/// Selects the endpoint with the minimum number of active connections.
#[derive(Debug, Default)]
pub struct LeastConnections;

impl LeastConnections {
    pub fn new() -> Self {
        Self
    }
}

impl LoadBalancer for LeastConnections {
    fn select<'a>(&self, eligible: &[&'a Endpoint]) -> Option<&'a Endpoint> {
        // In case of tie, the first one is selected (stability)
        eligible
            .iter()
            .copied()
            .min_by_key(|e| e.active_connections())
    }

    fn strategy(&self) -> Strategy {
        Strategy::LeastConnections
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resilience::BreakerSettings;

    #[test]
    fn test_least_conn() {
        let lb = LeastConnections::new();
        let mut e1 = Endpoint::new(0, "e1", "127.0.0.1:8080", BreakerSettings::default());
        let mut e2 = Endpoint::new(1, "e2", "127.0.0.1:8081", BreakerSettings::default());

        // artificially increase connections on e1
        e1.inc_connections();
        assert_eq!(lb.select(&[&e1, &e2]).unwrap().id(), 1);

        // now e2 has 2, e1 has 1
        e2.inc_connections();
        e2.inc_connections();
        assert_eq!(lb.select(&[&e1, &e2]).unwrap().id(), 0);
    }

    #[test]
    fn test_tie_goes_to_first_registered() {
        let lb = LeastConnections::new();
        let e1 = Endpoint::new(0, "e1", "127.0.0.1:8080", BreakerSettings::default());
        let e2 = Endpoint::new(1, "e2", "127.0.0.1:8081", BreakerSettings::default());
        for _ in 0..5 {
            assert_eq!(lb.select(&[&e1, &e2]).unwrap().id(), 0);
        }
    }
}
