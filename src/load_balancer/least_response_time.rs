//! Least Response Time load balancing strategy.

use crate::load_balancer::{endpoint::Endpoint, LoadBalancer, Strategy};

/// Selects the endpoint whose last call completed fastest.
///
/// Endpoints that have never answered report zero and are tried first.
#[derive(Debug, Default)]
pub struct LeastResponseTime;

impl LeastResponseTime {
    pub fn new() -> Self {
        Self
    }
}

impl LoadBalancer for LeastResponseTime {
    fn select<'a>(&self, eligible: &[&'a Endpoint]) -> Option<&'a Endpoint> {
        eligible
            .iter()
            .copied()
            .min_by_key(|e| e.last_response_time())
    }

    fn strategy(&self) -> Strategy {
        Strategy::LeastResponseTime
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resilience::BreakerSettings;
    use std::time::Duration;

    #[test]
    fn test_picks_fastest() {
        let lb = LeastResponseTime::new();
        let mut slow = Endpoint::new(0, "slow", "127.0.0.1:1", BreakerSettings::default());
        let mut fast = Endpoint::new(1, "fast", "127.0.0.1:2", BreakerSettings::default());
        slow.record_response_time(Duration::from_millis(250));
        fast.record_response_time(Duration::from_millis(20));

        assert_eq!(lb.select(&[&slow, &fast]).unwrap().name(), "fast");

        fast.record_response_time(Duration::from_millis(300));
        assert_eq!(lb.select(&[&slow, &fast]).unwrap().name(), "slow");
    }

    #[test]
    fn test_untried_endpoint_preferred() {
        let lb = LeastResponseTime::new();
        let mut tried = Endpoint::new(0, "tried", "127.0.0.1:1", BreakerSettings::default());
        let fresh = Endpoint::new(1, "fresh", "127.0.0.1:2", BreakerSettings::default());
        tried.record_response_time(Duration::from_millis(5));

        assert_eq!(lb.select(&[&tried, &fresh]).unwrap().name(), "fresh");
    }
}
