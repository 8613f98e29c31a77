//! Lock-free snapshot storage with atomic replacement.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::forwarding::{Cluster, Route};
use crate::snapshot::token::ChangeToken;

/// An immutable forwarding configuration plus its change token.
///
/// Never mutated after publication; readers may hold the Arc for as long
/// as a request lives.
#[derive(Debug)]
pub struct ConfigSnapshot {
    revision: u64,
    routes: Vec<Route>,
    clusters: Vec<Cluster>,
    token: ChangeToken,
}

impl ConfigSnapshot {
    fn new(revision: u64, routes: Vec<Route>, clusters: Vec<Cluster>) -> Self {
        Self {
            revision,
            routes,
            clusters,
            token: ChangeToken::new(),
        }
    }

    /// Monotonically increasing publication counter; 0 is the boot snapshot.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    pub fn cluster(&self, cluster_id: &str) -> Option<&Cluster> {
        self.clusters.iter().find(|c| c.cluster_id == cluster_id)
    }

    /// Goes stale exactly once, when a newer snapshot is published.
    pub fn change_token(&self) -> &ChangeToken {
        &self.token
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty() && self.clusters.is_empty()
    }
}

/// Holds the current snapshot; readers never block writers and vice versa.
///
/// Publication order: build the new snapshot with a fresh token, swap the
/// pointer, then invalidate the old token. A reader that subscribed before
/// the swap observes the stale transition; one that reads after the swap
/// gets the new snapshot with a token that is still fresh.
#[derive(Debug)]
pub struct SnapshotStore {
    current: ArcSwap<ConfigSnapshot>,
    revision: AtomicU64,
}

impl SnapshotStore {
    /// Create a store holding an empty boot snapshot (matches nothing).
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(ConfigSnapshot::new(0, Vec::new(), Vec::new())),
            revision: AtomicU64::new(0),
        }
    }

    /// The current snapshot. Lock-free; callers may hold it indefinitely.
    pub fn get(&self) -> Arc<ConfigSnapshot> {
        self.current.load_full()
    }

    /// Atomically replace the current snapshot, then mark the previous one
    /// stale, waking its observers.
    pub fn publish(&self, routes: Vec<Route>, clusters: Vec<Cluster>) -> Arc<ConfigSnapshot> {
        let revision = self.revision.fetch_add(1, Ordering::Relaxed) + 1;
        let next = Arc::new(ConfigSnapshot::new(revision, routes, clusters));
        let previous = self.current.swap(next.clone());
        previous.change_token().invalidate();
        next
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}
