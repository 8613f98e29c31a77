//! End-to-end reconciliation scenarios against a fake registry.

use std::sync::Arc;
use std::time::Duration;

use switchyard::config::ConsulConfig;
use switchyard::reconciler::Reconciler;
use switchyard::registry::RegistryClient;
use switchyard::snapshot::SnapshotStore;
use switchyard::Shutdown;

mod common;
use common::{instance, FakeRegistry};

fn reconciler_for(
    registry: Arc<FakeRegistry>,
    store: Arc<SnapshotStore>,
    config: &ConsulConfig,
) -> Reconciler {
    let client: Arc<dyn RegistryClient> = registry;
    Reconciler::new(client, store, config)
}

#[tokio::test]
async fn test_empty_registry_publishes_empty_snapshot_once() {
    let registry = Arc::new(FakeRegistry::new());
    let store = Arc::new(SnapshotStore::new());
    let boot = store.get();
    let mut reconciler = reconciler_for(registry, store.clone(), &ConsulConfig::default());

    // first observation publishes even when empty
    assert!(reconciler.run_once().await.unwrap());

    let snapshot = store.get();
    assert_eq!(snapshot.revision(), 1);
    assert!(snapshot.routes().is_empty());
    assert!(snapshot.clusters().is_empty());
    assert!(boot.change_token().is_stale());
    assert!(!snapshot.change_token().is_stale());

    // identical observation publishes nothing
    assert!(!reconciler.run_once().await.unwrap());
    assert_eq!(store.get().revision(), 1);
}

#[tokio::test]
async fn test_single_service_single_instance() {
    let registry = Arc::new(FakeRegistry::new());
    registry.put_service(
        "weather",
        vec![instance("w1", "weather", "10.0.0.5", 8080, &[("scheme", "https")])],
    );
    let store = Arc::new(SnapshotStore::new());
    let mut reconciler =
        reconciler_for(registry, store.clone(), &ConsulConfig::default());

    assert!(reconciler.run_once().await.unwrap());

    let snapshot = store.get();
    assert_eq!(snapshot.routes().len(), 1);
    let route = &snapshot.routes()[0];
    assert_eq!(route.route_id, "route-weather");
    assert_eq!(route.cluster_id, "cluster-weather");
    assert_eq!(route.path, "/api/weather/{**catch-all}");

    let cluster = snapshot.cluster("cluster-weather").unwrap();
    let destination = &cluster.destinations["weather-10.0.0.5-8080-w1"];
    assert_eq!(destination.address, "https://10.0.0.5:8080");
}

#[tokio::test]
async fn test_two_instances_one_cluster() {
    let registry = Arc::new(FakeRegistry::new());
    registry.put_service(
        "weather",
        vec![
            instance("w1", "weather", "10.0.0.5", 8080, &[]),
            instance("w2", "weather", "10.0.0.6", 8080, &[]),
        ],
    );
    let store = Arc::new(SnapshotStore::new());
    let mut reconciler =
        reconciler_for(registry, store.clone(), &ConsulConfig::default());

    reconciler.run_once().await.unwrap();

    let snapshot = store.get();
    let cluster = snapshot.cluster("cluster-weather").unwrap();
    assert_eq!(cluster.destinations.len(), 2);
    assert_eq!(
        cluster.load_balancing_policy,
        switchyard::forwarding::LoadBalancingPolicy::RoundRobin
    );
}

#[tokio::test]
async fn test_path_prefix_override_via_meta() {
    let registry = Arc::new(FakeRegistry::new());
    registry.put_service(
        "weather",
        vec![instance(
            "w1",
            "weather",
            "10.0.0.5",
            8080,
            &[("pathPrefix", "/v2/weather")],
        )],
    );
    let store = Arc::new(SnapshotStore::new());
    let mut reconciler =
        reconciler_for(registry, store.clone(), &ConsulConfig::default());

    reconciler.run_once().await.unwrap();

    assert_eq!(store.get().routes()[0].path, "/v2/weather/{**catch-all}");
}

#[tokio::test]
async fn test_service_removal_empties_snapshot() {
    let registry = Arc::new(FakeRegistry::new());
    registry.put_service(
        "weather",
        vec![instance("w1", "weather", "10.0.0.5", 8080, &[])],
    );
    let store = Arc::new(SnapshotStore::new());
    let mut reconciler =
        reconciler_for(registry.clone(), store.clone(), &ConsulConfig::default());

    reconciler.run_once().await.unwrap();
    let populated = store.get();
    assert_eq!(populated.routes().len(), 1);

    registry.remove_service("weather");
    assert!(reconciler.run_once().await.unwrap());

    let emptied = store.get();
    assert!(emptied.routes().is_empty());
    assert!(emptied.clusters().is_empty());
    assert!(populated.change_token().is_stale());
}

#[tokio::test]
async fn test_registry_outage_keeps_previous_snapshot() {
    let registry = Arc::new(FakeRegistry::new());
    registry.put_service(
        "weather",
        vec![instance("w1", "weather", "10.0.0.5", 8080, &[])],
    );
    let store = Arc::new(SnapshotStore::new());
    let mut reconciler =
        reconciler_for(registry.clone(), store.clone(), &ConsulConfig::default());

    reconciler.run_once().await.unwrap();
    let published = store.get();
    let revision = published.revision();

    // outage: the tick fails, the store is untouched, the token stays fresh
    registry.set_failing(true);
    assert!(reconciler.run_once().await.is_err());
    assert_eq!(store.get().revision(), revision);
    assert!(!published.change_token().is_stale());

    // recovery with the pre-outage set: equal map, no publication
    registry.set_failing(false);
    assert!(!reconciler.run_once().await.unwrap());
    assert_eq!(store.get().revision(), revision);
}

#[tokio::test]
async fn test_meta_change_triggers_republication() {
    let registry = Arc::new(FakeRegistry::new());
    registry.put_service(
        "weather",
        vec![instance("w1", "weather", "10.0.0.5", 8080, &[("weight", "1")])],
    );
    let store = Arc::new(SnapshotStore::new());
    let mut reconciler =
        reconciler_for(registry.clone(), store.clone(), &ConsulConfig::default());

    reconciler.run_once().await.unwrap();

    // same service id set, different weight
    registry.put_service(
        "weather",
        vec![instance("w1", "weather", "10.0.0.5", 8080, &[("weight", "5")])],
    );
    assert!(reconciler.run_once().await.unwrap());

    let snapshot = store.get();
    let cluster = snapshot.cluster("cluster-weather").unwrap();
    assert_eq!(cluster.destinations["weather-10.0.0.5-8080-w1"].weight, 5);
}

#[tokio::test]
async fn test_allow_list_filters_services() {
    let registry = Arc::new(FakeRegistry::new());
    registry.put_service(
        "weather",
        vec![instance("w1", "weather", "10.0.0.5", 8080, &[])],
    );
    registry.put_service(
        "billing",
        vec![instance("b1", "billing", "10.0.1.5", 8080, &[])],
    );

    let mut config = ConsulConfig::default();
    config.service_names = vec!["weather".into()];

    let store = Arc::new(SnapshotStore::new());
    let mut reconciler = reconciler_for(registry, store.clone(), &config);
    reconciler.run_once().await.unwrap();

    let snapshot = store.get();
    assert_eq!(snapshot.routes().len(), 1);
    assert_eq!(snapshot.routes()[0].route_id, "route-weather");
}

#[tokio::test]
async fn test_route_mapping_override_wins() {
    let registry = Arc::new(FakeRegistry::new());
    registry.put_service(
        "weather",
        vec![instance(
            "w1",
            "weather",
            "10.0.0.5",
            8080,
            &[("pathPrefix", "/v2/weather")],
        )],
    );

    let mut config = ConsulConfig::default();
    config
        .service_route_mappings
        .insert("weather".into(), "/wx/{**catch-all}".into());

    let store = Arc::new(SnapshotStore::new());
    let mut reconciler = reconciler_for(registry, store.clone(), &config);
    reconciler.run_once().await.unwrap();

    assert_eq!(store.get().routes()[0].path, "/wx/{**catch-all}");
}

#[tokio::test]
async fn test_waiter_on_old_snapshot_wakes_on_publication() {
    let registry = Arc::new(FakeRegistry::new());
    let store = Arc::new(SnapshotStore::new());
    let mut reconciler =
        reconciler_for(registry.clone(), store.clone(), &ConsulConfig::default());

    reconciler.run_once().await.unwrap();
    let held = store.get();

    let waiter = {
        let held = held.clone();
        tokio::spawn(async move { held.change_token().changed().await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;

    registry.put_service(
        "weather",
        vec![instance("w1", "weather", "10.0.0.5", 8080, &[])],
    );
    reconciler.run_once().await.unwrap();

    tokio::time::timeout(Duration::from_secs(1), waiter)
        .await
        .expect("waiter should observe the publication")
        .unwrap();

    // the new snapshot is only reachable through the store
    assert_eq!(store.get().routes().len(), 1);
}

#[tokio::test]
async fn test_run_loop_publishes_immediately_and_honors_shutdown() {
    let registry = Arc::new(FakeRegistry::new());
    registry.put_service(
        "weather",
        vec![instance("w1", "weather", "10.0.0.5", 8080, &[])],
    );

    let store = Arc::new(SnapshotStore::new());
    let reconciler =
        reconciler_for(registry, store.clone(), &ConsulConfig::default());

    let shutdown = Shutdown::new();
    let task = tokio::spawn(reconciler.run(shutdown.subscribe()));

    // the first attempt happens immediately, well before the refresh interval
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(store.get().revision(), 1);

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(1), task)
        .await
        .expect("reconciler should stop on shutdown")
        .unwrap();
}
