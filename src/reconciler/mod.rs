//! Registry-to-snapshot reconciliation loop.
//!
//! # Data Flow
//! ```text
//! timer tick (refresh interval, first tick immediate)
//!     → discovery::ServiceMapBuilder (query the registry)
//!     → diff against the last observed map
//!     → forwarding::translate (routes + clusters)
//!     → snapshot store publish (atomic swap, token fan-out)
//! ```
//!
//! # Design Decisions
//! - Exactly one loop; publications are totally ordered by construction
//! - A failed tick leaves the store untouched; the next tick retries
//! - The first successful observation always publishes, even when empty,
//!   so the boot snapshot's token fires once the registry has been seen
//! - Identical consecutive observations publish nothing

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;

use crate::config::ConsulConfig;
use crate::discovery::{ServiceMap, ServiceMapBuilder};
use crate::forwarding::{build_clusters, build_routes};
use crate::observability::metrics;
use crate::registry::{RegistryClient, RegistryError};
use crate::snapshot::SnapshotStore;

/// Drives the snapshot store from periodic registry observations.
pub struct Reconciler {
    builder: ServiceMapBuilder,
    store: Arc<SnapshotStore>,
    route_overrides: HashMap<String, String>,
    refresh_interval: Duration,
    last_map: Option<ServiceMap>,
}

impl Reconciler {
    pub fn new(
        client: Arc<dyn RegistryClient>,
        store: Arc<SnapshotStore>,
        config: &ConsulConfig,
    ) -> Self {
        Self {
            builder: ServiceMapBuilder::new(client, config.service_names.clone()),
            store,
            route_overrides: config.service_route_mappings.clone(),
            refresh_interval: Duration::from_secs(config.refresh_interval_secs.max(1)),
            last_map: None,
        }
    }

    /// One observation: build, diff, publish if changed.
    ///
    /// Returns whether a snapshot was published. A registry error aborts
    /// the attempt without touching the store.
    pub async fn run_once(&mut self) -> Result<bool, RegistryError> {
        let new_map = self.builder.build().await?;

        if self.last_map.as_ref() == Some(&new_map) {
            return Ok(false);
        }

        let changed = self
            .last_map
            .as_ref()
            .map(|last| last.changed_services(&new_map))
            .unwrap_or_else(|| new_map.iter().map(|(name, _)| name.clone()).collect());

        let routes = build_routes(&new_map, &self.route_overrides);
        let clusters = build_clusters(&new_map);
        let snapshot = self.store.publish(routes, clusters);

        tracing::info!(
            revision = snapshot.revision(),
            services = new_map.len(),
            changed = ?changed,
            "published forwarding configuration"
        );
        metrics::record_snapshot(
            snapshot.revision(),
            snapshot.routes().len(),
            snapshot.clusters().len(),
        );

        self.last_map = Some(new_map);
        Ok(true)
    }

    /// Run until the shutdown signal fires. The first attempt happens
    /// immediately; later attempts follow the refresh interval.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        let mut ticker = tokio::time::interval(self.refresh_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.recv() => {
                    tracing::info!("reconciler stopping");
                    return;
                }
            }

            let started = Instant::now();
            let outcome = tokio::select! {
                result = self.run_once() => result,
                _ = shutdown.recv() => {
                    tracing::info!("reconciler stopping");
                    return;
                }
            };

            match outcome {
                Ok(true) => metrics::record_reconcile("published", started),
                Ok(false) => metrics::record_reconcile("unchanged", started),
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        "discovery tick failed; keeping previous configuration"
                    );
                    metrics::record_reconcile("error", started);
                }
            }
        }
    }
}
