//! HTTP server setup and the forwarding handler.
//!
//! # Responsibilities
//! - Create the Axum router with middleware (tracing, timeout, request id)
//! - Answer the registry's health probe
//! - Dispatch requests against the current snapshot
//! - Forward requests to the selected destination

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::GatewayConfig;
use crate::forwarding::{Route, RoundRobinState};
use crate::http::request::{request_id, X_REQUEST_ID};
use crate::observability::metrics;
use crate::snapshot::{ConfigSnapshot, SnapshotStore};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    store: Arc<SnapshotStore>,
    client: reqwest::Client,
    balancer: Arc<RoundRobinState>,
    observed_revision: Arc<AtomicU64>,
    max_body_bytes: usize,
}

/// HTTP server for the gateway.
pub struct GatewayServer {
    router: Router,
}

impl GatewayServer {
    /// Create a server reading forwarding configuration from `store`.
    pub fn new(config: &GatewayConfig, store: Arc<SnapshotStore>) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.listener.request_timeout_secs))
            .build()?;

        let state = AppState {
            store,
            client,
            balancer: Arc::new(RoundRobinState::new()),
            observed_revision: Arc::new(AtomicU64::new(0)),
            max_body_bytes: config.listener.max_body_bytes,
        };

        let router = Router::new()
            .route("/health", get(health_handler))
            .route("/gateway/config", get(config_handler))
            .route("/", any(gateway_handler))
            .route("/{*path}", any(gateway_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.listener.request_timeout_secs,
            )))
            .layer(axum::middleware::from_fn(request_id))
            .layer(TraceLayer::new_for_http());

        Ok(Self { router })
    }

    /// Run the server until the shutdown signal fires, then drain.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn health_handler() -> StatusCode {
    StatusCode::OK
}

/// Dump the live forwarding configuration for operators.
async fn config_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    let snapshot = state.store.get();
    Json(serde_json::json!({
        "revision": snapshot.revision(),
        "routes": snapshot.routes(),
        "clusters": snapshot.clusters(),
    }))
}

/// Main forwarding handler: snapshot → route → destination → upstream.
async fn gateway_handler(State(state): State<AppState>, request: Request) -> Response {
    let started = Instant::now();

    // One snapshot per request, held until the response is built.
    let snapshot = state.store.get();
    let revision = snapshot.revision();
    if state.observed_revision.swap(revision, Ordering::Relaxed) != revision {
        state.balancer.reset();
    }

    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();
    let path = request.uri().path().to_string();

    let Some(route) = match_route(&snapshot, &path) else {
        tracing::debug!(request_id = %request_id, path = %path, "no route matched");
        return (StatusCode::NOT_FOUND, "No matching route found").into_response();
    };

    let Some(cluster) = snapshot.cluster(&route.cluster_id) else {
        tracing::error!(
            request_id = %request_id,
            cluster = %route.cluster_id,
            "route references a missing cluster"
        );
        return (StatusCode::BAD_GATEWAY, "No upstream cluster").into_response();
    };

    let Some((destination_id, destination)) = state.balancer.pick(cluster) else {
        tracing::warn!(
            request_id = %request_id,
            cluster = %cluster.cluster_id,
            "cluster has no destinations"
        );
        return (StatusCode::BAD_GATEWAY, "No destinations available").into_response();
    };

    let cluster_id = cluster.cluster_id.clone();
    let target = format!(
        "{}{}",
        destination.address,
        request
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/")
    );

    tracing::debug!(
        request_id = %request_id,
        destination = %destination_id,
        target = %target,
        "forwarding request"
    );

    let method = request.method().clone();
    let mut headers = request.headers().clone();
    headers.remove(header::HOST);

    let body = match axum::body::to_bytes(request.into_body(), state.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(_) => {
            return (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response();
        }
    };

    match state
        .client
        .request(method.clone(), &target)
        .headers(headers)
        .body(body)
        .send()
        .await
    {
        Ok(upstream) => {
            let status = upstream.status();
            let mut response_headers = upstream.headers().clone();
            response_headers.remove(header::TRANSFER_ENCODING);
            response_headers.remove(header::CONNECTION);

            metrics::record_request(method.as_str(), status.as_u16(), &cluster_id, started);

            let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
            *response.status_mut() = status;
            *response.headers_mut() = response_headers;
            response
        }
        Err(e) => {
            tracing::error!(
                request_id = %request_id,
                error = %e,
                target = %target,
                "upstream request failed"
            );
            metrics::record_request(method.as_str(), 502, &cluster_id, started);
            (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
        }
    }
}

/// Longest matching route prefix wins.
fn match_route<'a>(snapshot: &'a ConfigSnapshot, path: &str) -> Option<&'a Route> {
    snapshot
        .routes()
        .iter()
        .filter(|route| route.matches(path))
        .max_by_key(|route| route.prefix().len())
}
