use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;

use switchyard::config::loader;
use switchyard::http::GatewayServer;
use switchyard::lifecycle::{signals, Shutdown};
use switchyard::observability::{logging, metrics};
use switchyard::reconciler::Reconciler;
use switchyard::registration::RegistrationAgent;
use switchyard::registry::{ConsulClient, RegistryClient};
use switchyard::snapshot::SnapshotStore;

#[derive(Parser)]
#[command(name = "switchyard")]
#[command(about = "Dynamic API gateway driven by a Consul service registry", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = loader::load_config(cli.config.as_deref())?;
    logging::init(&config.observability.log_level);

    tracing::info!(
        registry = %config.consul.address,
        bind_address = %config.listener.bind_address,
        refresh_interval_secs = config.consul.refresh_interval_secs,
        "configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "failed to parse metrics address"
            ),
        }
    }

    // Registry calls may never outlive a refresh period.
    let call_timeout = Duration::from_secs(config.consul.refresh_interval_secs.max(1));
    let consul: Arc<dyn RegistryClient> =
        Arc::new(ConsulClient::new(&config.consul.address, call_timeout)?);

    let store = Arc::new(SnapshotStore::new());
    let shutdown = Shutdown::new();

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let bound = listener.local_addr()?;

    let server = GatewayServer::new(&config, store.clone())?;
    let server_task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    // The listener is accepting; the registry's first health probe can pass.
    let mut agent = RegistrationAgent::new(consul.clone(), config.consul.clone());
    agent.register(bound).await;

    let reconciler = Reconciler::new(consul, store, &config.consul);
    let reconciler_task = tokio::spawn(reconciler.run(shutdown.subscribe()));

    signals::wait_for_signal().await;

    // Stop accepting, retract our registration, stop reconciling, drain.
    shutdown.trigger();
    agent.deregister().await;
    let _ = reconciler_task.await;
    let _ = server_task.await;

    tracing::info!("shutdown complete");
    Ok(())
}
