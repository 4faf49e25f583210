//! Weighted random load balancing strategy.
//!
//! Weight of an endpoint is `max(floor, ceiling - consecutive_failures)`, so
//! endpoints that keep failing get picked less often without ever starving.

use rand::Rng;
use crate::load_balancer::{endpoint::Endpoint, LoadBalancer, Strategy};

/// Weighted random selector.
#[derive(Debug)]
pub struct WeightedRandom {
    floor: u32,
    ceiling: u32,
}

impl WeightedRandom {
    pub fn new(floor: u32, ceiling: u32) -> Self {
        let floor = floor.max(1);
        Self {
            floor,
            ceiling: ceiling.max(floor),
        }
    }

    /// Selection weight for one endpoint.
    pub fn weight(&self, endpoint: &Endpoint) -> u64 {
        let weight = self.ceiling.saturating_sub(endpoint.consecutive_failures()).max(self.floor);
        u64::from(weight)
    }

    /// Deterministic pick for a draw in `[0, total_weight)`.
    pub fn pick<'a>(&self, eligible: &[&'a Endpoint], draw: u64) -> Option<&'a Endpoint> {
        let cumulative: Vec<u64> = eligible
            .iter()
            .scan(0u64, |total, e| {
                *total += self.weight(e);
                Some(*total)
            })
            .collect();

        let index = cumulative.partition_point(|&c| c <= draw);
        eligible.get(index).copied()
    }

    fn total_weight(&self, eligible: &[&Endpoint]) -> u64 {
        eligible.iter().map(|e| self.weight(e)).sum()
    }
}

impl Default for WeightedRandom {
    fn default() -> Self {
        Self::new(1, 10)
    }
}

impl LoadBalancer for WeightedRandom {
    fn select<'a>(&self, eligible: &[&'a Endpoint]) -> Option<&'a Endpoint> {
        if eligible.is_empty() {
            return None;
        }
        let total = self.total_weight(eligible);
        let draw = rand::thread_rng().gen_range(0..total);
        self.pick(eligible, draw)
    }

    fn strategy(&self) -> Strategy {
        Strategy::WeightedRandom
    }
}
