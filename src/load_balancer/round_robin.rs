//! Round-robin load balancing strategy.

use std::sync::atomic::{AtomicUsize, Ordering};
use crate::load_balancer::{endpoint::Endpoint, LoadBalancer, Strategy};

/// Round-robin selector.
/// Stores an internal counter to rotate through endpoints.
#[derive(Debug, Default)]
pub struct RoundRobin {
    counter: AtomicUsize,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LoadBalancer for RoundRobin {
    fn select<'a>(&self, eligible: &[&'a Endpoint]) -> Option<&'a Endpoint> {
        if eligible.is_empty() {
            return None;
        }

        // fetch_add hands every caller a distinct ticket.
        let ticket = self.counter.fetch_add(1, Ordering::Relaxed);
        Some(eligible[ticket % eligible.len()])
    }

    fn strategy(&self) -> Strategy {
        Strategy::RoundRobin
    }
}
