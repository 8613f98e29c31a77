//! Metrics collection and exposition.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Initialize the Prometheus exporter and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .expect("failed to install Prometheus recorder");

    tracing::info!("Metrics server listening on http://{}", addr);
}

/// Record the outcome of one reconciler tick.
pub fn record_reconcile(outcome: &'static str, started: Instant) {
    counter!("gateway_reconcile_ticks_total", "outcome" => outcome).increment(1);
    histogram!("gateway_reconcile_duration_seconds", "outcome" => outcome)
        .record(started.elapsed().as_secs_f64());
}

/// Record a published snapshot's shape.
pub fn record_snapshot(revision: u64, routes: usize, clusters: usize) {
    counter!("gateway_snapshots_published_total").increment(1);
    gauge!("gateway_snapshot_revision").set(revision as f64);
    gauge!("gateway_routes").set(routes as f64);
    gauge!("gateway_clusters").set(clusters as f64);
}

/// Record whether this process is currently registered in the registry.
pub fn record_registration(registered: bool) {
    let val = if registered { 1.0 } else { 0.0 };
    gauge!("gateway_registered").set(val);
}

/// Record one proxied request.
pub fn record_request(method: &str, status: u16, cluster: &str, started: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("status", status.to_string()),
        ("cluster", cluster.to_string()),
    ];

    counter!("gateway_requests_total", &labels).increment(1);
    histogram!("gateway_request_duration_seconds", &labels)
        .record(started.elapsed().as_secs_f64());
}
