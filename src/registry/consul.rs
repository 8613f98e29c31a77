//! Consul HTTP API client.
//!
//! Thin typed wrapper over the agent and catalog endpoints:
//! `PUT /v1/agent/service/register`, `PUT /v1/agent/service/deregister/{id}`,
//! `GET /v1/catalog/services`, `GET /v1/health/service/{name}?passing=true`.

use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::discovery::ServiceInstance;
use crate::registry::client::{
    HealthCheck, RegistryClient, RegistryError, ServiceRegistration,
};

/// Client for a single Consul agent.
pub struct ConsulClient {
    base: String,
    http: reqwest::Client,
}

impl ConsulClient {
    /// Create a client for the agent at `address` (e.g. `http://localhost:8500`).
    ///
    /// Every call made through the client is bounded by `call_timeout`.
    pub fn new(address: &str, call_timeout: Duration) -> Result<Self, RegistryError> {
        let parsed =
            Url::parse(address).map_err(|_| RegistryError::Address(address.to_string()))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(RegistryError::Address(address.to_string()));
        }

        let http = reqwest::Client::builder().timeout(call_timeout).build()?;
        Ok(Self {
            base: address.trim_end_matches('/').to_string(),
            http,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    async fn ensure_success(resp: reqwest::Response) -> Result<reqwest::Response, RegistryError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(RegistryError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl RegistryClient for ConsulClient {
    async fn register(&self, record: &ServiceRegistration) -> Result<(), RegistryError> {
        let body = RegisterBody::from(record);
        let resp = self
            .http
            .put(self.endpoint("/v1/agent/service/register"))
            .json(&body)
            .send()
            .await?;
        Self::ensure_success(resp).await?;
        Ok(())
    }

    async fn deregister(&self, service_id: &str) -> Result<(), RegistryError> {
        let resp = self
            .http
            .put(self.endpoint(&format!("/v1/agent/service/deregister/{service_id}")))
            .send()
            .await?;
        Self::ensure_success(resp).await?;
        Ok(())
    }

    async fn list_service_names(&self) -> Result<BTreeSet<String>, RegistryError> {
        let resp = self
            .http
            .get(self.endpoint("/v1/catalog/services"))
            .send()
            .await?;
        let resp = Self::ensure_success(resp).await?;
        let text = resp.text().await?;
        let services: HashMap<String, Vec<String>> =
            serde_json::from_str(&text).map_err(|e| RegistryError::Decode(e.to_string()))?;
        Ok(services.into_keys().collect())
    }

    async fn list_healthy_instances(
        &self,
        service_name: &str,
    ) -> Result<Vec<ServiceInstance>, RegistryError> {
        let resp = self
            .http
            .get(self.endpoint(&format!("/v1/health/service/{service_name}")))
            .query(&[("passing", "true")])
            .send()
            .await?;
        let resp = Self::ensure_success(resp).await?;
        let text = resp.text().await?;
        let entries: Vec<HealthEntry> =
            serde_json::from_str(&text).map_err(|e| RegistryError::Decode(e.to_string()))?;

        let mut instances = Vec::with_capacity(entries.len());
        let mut dropped = 0usize;
        for entry in entries {
            let svc = entry.service;
            if svc.id.is_empty() || svc.address.is_empty() || svc.port == 0 {
                dropped += 1;
                continue;
            }
            instances.push(ServiceInstance::from_registry(
                svc.id,
                svc.service,
                svc.address,
                svc.port,
                svc.tags,
                svc.meta,
            ));
        }
        if dropped > 0 {
            tracing::warn!(
                service = %service_name,
                dropped,
                "dropped malformed instances from registry response"
            );
        }
        Ok(instances)
    }
}

#[derive(Debug, Deserialize)]
struct HealthEntry {
    #[serde(rename = "Service")]
    service: HealthService,
}

#[derive(Debug, Deserialize)]
struct HealthService {
    #[serde(rename = "ID", default)]
    id: String,
    #[serde(rename = "Service", default)]
    service: String,
    #[serde(rename = "Address", default)]
    address: String,
    #[serde(rename = "Port", default)]
    port: u16,
    #[serde(rename = "Tags", default)]
    tags: Vec<String>,
    #[serde(rename = "Meta", default)]
    meta: HashMap<String, String>,
}

#[derive(Debug, Serialize)]
struct RegisterBody<'a> {
    #[serde(rename = "ID")]
    id: &'a str,
    #[serde(rename = "Name")]
    name: &'a str,
    #[serde(rename = "Address")]
    address: &'a str,
    #[serde(rename = "Port")]
    port: u16,
    #[serde(rename = "Tags")]
    tags: &'a [String],
    #[serde(rename = "Meta")]
    meta: &'a HashMap<String, String>,
    #[serde(rename = "Check")]
    check: CheckBody,
}

#[derive(Debug, Serialize)]
struct CheckBody {
    #[serde(rename = "HTTP")]
    http: String,
    #[serde(rename = "Interval")]
    interval: String,
    #[serde(rename = "Timeout")]
    timeout: String,
    #[serde(rename = "DeregisterCriticalServiceAfter")]
    deregister_after: String,
    #[serde(rename = "TLSSkipVerify")]
    tls_skip_verify: bool,
}

impl<'a> From<&'a ServiceRegistration> for RegisterBody<'a> {
    fn from(record: &'a ServiceRegistration) -> Self {
        Self {
            id: &record.id,
            name: &record.name,
            address: &record.address,
            port: record.port,
            tags: &record.tags,
            meta: &record.meta,
            check: CheckBody::from(&record.check),
        }
    }
}

impl From<&HealthCheck> for CheckBody {
    fn from(check: &HealthCheck) -> Self {
        Self {
            http: check.http.clone(),
            interval: format!("{}s", check.interval.as_secs()),
            timeout: format!("{}s", check.timeout.as_secs()),
            deregister_after: format!("{}s", check.deregister_after.as_secs()),
            tls_skip_verify: check.tls_skip_verify,
        }
    }
}
