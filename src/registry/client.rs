//! Registry capability trait and error definitions.

use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::discovery::ServiceInstance;

/// Errors that can occur talking to the registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The configured registry base address is not a usable URL.
    #[error("invalid registry address '{0}'")]
    Address(String),

    /// Connection failure, timeout, or other transport-level error.
    #[error("registry transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The registry answered with a non-success status.
    #[error("registry returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body did not match the expected shape.
    #[error("failed to decode registry response: {0}")]
    Decode(String),
}

/// Health check the registry runs against a registered service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthCheck {
    /// Probe URL, e.g. `http://10.0.0.5:8080/health`.
    pub http: String,
    pub interval: Duration,
    pub timeout: Duration,
    /// How long the service may stay critical before the registry drops it.
    pub deregister_after: Duration,
    pub tls_skip_verify: bool,
}

/// What the registration agent publishes into the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRegistration {
    /// Unique within the registry; uniqueness is enforced by construction
    /// (`{name}-{address}-{port}-{random}`).
    pub id: String,
    pub name: String,
    pub address: String,
    pub port: u16,
    pub tags: Vec<String>,
    pub meta: HashMap<String, String>,
    pub check: HealthCheck,
}

/// Capability set the control plane needs from a registry.
///
/// `register` is idempotent keyed by `record.id`; `deregister` succeeds for
/// unknown ids. Implementations report transport errors and perform no
/// retries of their own.
#[async_trait]
pub trait RegistryClient: Send + Sync {
    async fn register(&self, record: &ServiceRegistration) -> Result<(), RegistryError>;

    async fn deregister(&self, service_id: &str) -> Result<(), RegistryError>;

    async fn list_service_names(&self) -> Result<BTreeSet<String>, RegistryError>;

    /// Instances currently passing their health check, in registry order.
    async fn list_healthy_instances(
        &self,
        service_name: &str,
    ) -> Result<Vec<ServiceInstance>, RegistryError>;
}
