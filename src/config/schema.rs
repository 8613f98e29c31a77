//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::discovery::{Protocol, Scheme};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, body limits).
    pub listener: ListenerConfig,

    /// Registry integration: registration identity and discovery cadence.
    pub consul: ConsulConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Request timeout in seconds (total time for request/response).
    pub request_timeout_secs: u64,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 30,
            max_body_bytes: 2 * 1024 * 1024,
        }
    }
}

/// Registry (Consul) configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ConsulConfig {
    /// Base URL of the registry agent.
    pub address: String,

    /// Logical service name to register under; empty means the process name.
    pub service_name: String,

    /// Explicit address to register instead of a resolved interface address.
    pub service_address: Option<String>,

    /// Explicit port to register instead of the bound listener port.
    pub service_port: Option<u16>,

    /// Prefixes or regexes selecting which local network to advertise.
    pub preferred_networks: Vec<String>,

    /// Route path prefix advertised in service meta.
    pub path_prefix: String,

    /// Load-balancing weight advertised in service meta.
    pub weight: u32,

    /// Scheme the registry's health check (and peers) should use to reach us.
    pub http_scheme: Scheme,

    /// Application protocol advertised in service meta.
    pub protocol: Protocol,

    /// Deployment environment label advertised in service meta.
    pub environment: String,

    /// Path probed by the registry's health check.
    pub health_check_path: String,

    /// Health check interval in seconds.
    pub health_check_interval_secs: u64,

    /// Health check timeout in seconds.
    pub health_check_timeout_secs: u64,

    /// How long a critical service may linger before the registry drops it.
    pub deregister_critical_after_secs: u64,

    /// Tags passed through to the registration record.
    pub tags: Vec<String>,

    /// Extra meta passed through to the registration record.
    pub meta: HashMap<String, String>,

    /// Reconciler cadence in seconds.
    pub refresh_interval_secs: u64,

    /// Allow-list of service names to route to; empty means all.
    pub service_names: Vec<String>,

    /// Explicit route path overrides, service name → path pattern.
    pub service_route_mappings: HashMap<String, String>,
}

impl Default for ConsulConfig {
    fn default() -> Self {
        Self {
            address: "http://localhost:8500".to_string(),
            service_name: String::new(),
            service_address: None,
            service_port: None,
            preferred_networks: Vec::new(),
            path_prefix: String::new(),
            weight: 1,
            http_scheme: Scheme::Http,
            protocol: Protocol::Http,
            environment: String::new(),
            health_check_path: "/health".to_string(),
            health_check_interval_secs: 10,
            health_check_timeout_secs: 5,
            deregister_critical_after_secs: 30,
            tags: Vec::new(),
            meta: HashMap::new(),
            refresh_interval_secs: 10,
            service_names: Vec::new(),
            service_route_mappings: HashMap::new(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
