//! Registration agent lifecycle.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::config::ConsulConfig;
use crate::discovery::instance::{
    META_ENVIRONMENT, META_PATH_PREFIX, META_PROTOCOL, META_SCHEME, META_WEIGHT,
};
use crate::observability::metrics;
use crate::registration::resolver::AddressResolver;
use crate::registry::{HealthCheck, RegistryClient, ServiceRegistration};

/// Where the agent is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentState {
    Idle,
    Registered,
    Deregistering,
    Terminal,
}

/// Publishes this process into the registry and retracts it on shutdown.
pub struct RegistrationAgent {
    client: Arc<dyn RegistryClient>,
    config: ConsulConfig,
    resolver: AddressResolver,
    state: AgentState,
    registration: Option<ServiceRegistration>,
}

impl RegistrationAgent {
    pub fn new(client: Arc<dyn RegistryClient>, config: ConsulConfig) -> Self {
        let resolver = AddressResolver::new(&config.preferred_networks);
        Self {
            client,
            config,
            resolver,
            state: AgentState::Idle,
            registration: None,
        }
    }

    pub fn state(&self) -> AgentState {
        self.state
    }

    /// The id this process registered under, once registered.
    pub fn service_id(&self) -> Option<&str> {
        self.registration.as_ref().map(|r| r.id.as_str())
    }

    /// Build the record to publish, given the listener's bound address.
    ///
    /// The id embeds a fresh 128-bit value, so uniqueness holds by
    /// construction even across restarts of the same host and port.
    pub fn build_registration(&self, bound: SocketAddr) -> ServiceRegistration {
        let resolved = self.resolver.resolve(&self.config, bound);
        let name = if self.config.service_name.is_empty() {
            process_name()
        } else {
            self.config.service_name.clone()
        };

        let mut meta: HashMap<String, String> = self.config.meta.clone();
        meta.insert(META_PATH_PREFIX.into(), self.config.path_prefix.clone());
        meta.insert(META_WEIGHT.into(), self.config.weight.to_string());
        meta.insert(META_SCHEME.into(), resolved.scheme.to_string());
        meta.insert(META_PROTOCOL.into(), self.config.protocol.to_string());
        meta.insert(META_ENVIRONMENT.into(), self.config.environment.clone());

        let check = HealthCheck {
            http: format!(
                "{}://{}:{}{}",
                resolved.scheme, resolved.host, resolved.port, self.config.health_check_path
            ),
            interval: Duration::from_secs(self.config.health_check_interval_secs),
            timeout: Duration::from_secs(self.config.health_check_timeout_secs),
            deregister_after: Duration::from_secs(self.config.deregister_critical_after_secs),
            tls_skip_verify: true,
        };

        ServiceRegistration {
            id: format!(
                "{}-{}-{}-{}",
                name,
                resolved.host,
                resolved.port,
                Uuid::new_v4().simple()
            ),
            name,
            address: resolved.host,
            port: resolved.port,
            tags: self.config.tags.clone(),
            meta,
            check,
        }
    }

    /// Register this process. Call only once the listener at `bound` is
    /// accepting, so the registry's first health probe can succeed.
    pub async fn register(&mut self, bound: SocketAddr) {
        if self.state != AgentState::Idle {
            return;
        }

        let record = self.build_registration(bound);
        match self.client.register(&record).await {
            Ok(()) => {
                tracing::info!(
                    service_id = %record.id,
                    service = %record.name,
                    address = %record.address,
                    port = record.port,
                    "registered with the service registry"
                );
                self.registration = Some(record);
                self.state = AgentState::Registered;
                metrics::record_registration(true);
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    service = %record.name,
                    "service registration failed; gateway will not be discoverable"
                );
            }
        }
    }

    /// Retract the registration. Errors are logged and never block exit.
    pub async fn deregister(&mut self) {
        let Some(record) = self.registration.take() else {
            self.state = AgentState::Terminal;
            return;
        };

        self.state = AgentState::Deregistering;
        match self.client.deregister(&record.id).await {
            Ok(()) => {
                tracing::info!(service_id = %record.id, "deregistered from the service registry");
            }
            Err(e) => {
                tracing::warn!(
                    service_id = %record.id,
                    error = %e,
                    "deregistration failed; the registry will reap the record after its critical window"
                );
            }
        }
        self.state = AgentState::Terminal;
        metrics::record_registration(false);
    }
}

fn process_name() -> String {
    std::env::current_exe()
        .ok()
        .and_then(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .map(String::from)
        })
        .unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string())
}
