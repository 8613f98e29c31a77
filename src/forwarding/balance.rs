//! Round-robin destination selection.
//!
//! # Algorithm
//! Rotate through a cluster's destinations in key order.
//!
//! # Design Decisions
//! - Uses atomic counters, no locks
//! - Cursors are keyed by cluster id and live outside the snapshot,
//!   keeping published snapshots immutable
//! - Counters wrap around on overflow

use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::DashMap;

use crate::forwarding::cluster::{Cluster, Destination};

/// Per-cluster round-robin cursors.
#[derive(Debug, Default)]
pub struct RoundRobinState {
    cursors: DashMap<String, AtomicUsize>,
}

impl RoundRobinState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pick the next destination of `cluster`, or None when it has none.
    pub fn pick<'a>(&self, cluster: &'a Cluster) -> Option<(&'a str, &'a Destination)> {
        if cluster.destinations.is_empty() {
            return None;
        }

        let cursor = self
            .cursors
            .entry(cluster.cluster_id.clone())
            .or_insert_with(|| AtomicUsize::new(0));
        let index = cursor.fetch_add(1, Ordering::Relaxed) % cluster.destinations.len();

        cluster
            .destinations
            .iter()
            .nth(index)
            .map(|(id, dest)| (id.as_str(), dest))
    }

    /// Drop all cursors; called when a new snapshot generation is observed.
    pub fn reset(&self) {
        self.cursors.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::Protocol;
    use crate::forwarding::cluster::LoadBalancingPolicy;
    use std::collections::BTreeMap;

    fn cluster(addresses: &[&str]) -> Cluster {
        let mut destinations = BTreeMap::new();
        for (i, addr) in addresses.iter().enumerate() {
            destinations.insert(
                format!("svc-dest-{i}"),
                Destination {
                    address: addr.to_string(),
                    weight: 1,
                    protocol: Protocol::Http,
                },
            );
        }
        Cluster {
            cluster_id: "cluster-svc".into(),
            service_name: "svc".into(),
            load_balancing_policy: LoadBalancingPolicy::RoundRobin,
            destinations,
        }
    }

    #[test]
    fn test_rotates_through_destinations() {
        let state = RoundRobinState::new();
        let c = cluster(&["http://10.0.0.1:80", "http://10.0.0.2:80"]);

        let first = state.pick(&c).unwrap().0.to_string();
        let second = state.pick(&c).unwrap().0.to_string();
        let third = state.pick(&c).unwrap().0.to_string();

        assert_ne!(first, second);
        assert_eq!(first, third);
    }

    #[test]
    fn test_empty_cluster_yields_none() {
        let state = RoundRobinState::new();
        assert!(state.pick(&cluster(&[])).is_none());
    }

    #[test]
    fn test_reset_restarts_rotation() {
        let state = RoundRobinState::new();
        let c = cluster(&["http://10.0.0.1:80", "http://10.0.0.2:80"]);

        let first = state.pick(&c).unwrap().0.to_string();
        state.reset();
        let after_reset = state.pick(&c).unwrap().0.to_string();
        assert_eq!(first, after_reset);
    }
}
