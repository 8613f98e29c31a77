//! Upstream cluster and destination definitions.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::discovery::Protocol;

/// Destination selection policy for a cluster.
///
/// Only round robin is wired today; the weighted variant is reserved so a
/// per-protocol policy can be introduced without a wire-format break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LoadBalancingPolicy {
    RoundRobin,
    WeightedRoundRobin,
}

/// One backing URL inside a cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Destination {
    /// Full upstream URL, e.g. `https://10.0.0.5:8080`.
    pub address: String,
    pub weight: u32,
    pub protocol: Protocol,
}

/// A named group of destinations plus a selection policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cluster {
    /// `cluster-{service_name}`.
    pub cluster_id: String,
    pub service_name: String,
    pub load_balancing_policy: LoadBalancingPolicy,

    /// Keyed by destination id (`{service}-{address}-{port}-{service_id}`),
    /// ordered so snapshots serialize deterministically.
    pub destinations: BTreeMap<String, Destination>,
}
