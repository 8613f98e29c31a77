//! Shared fixtures for integration tests.
#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;

use switchyard::discovery::ServiceInstance;
use switchyard::registry::{RegistryClient, RegistryError, ServiceRegistration};

/// In-memory registry with programmable failure injection.
///
/// Satisfies the same capability set as the Consul client: register is
/// idempotent keyed by id, deregister succeeds for unknown ids, listings
/// reflect whatever the test seeded.
#[derive(Default)]
pub struct FakeRegistry {
    services: RwLock<BTreeMap<String, Vec<ServiceInstance>>>,
    registrations: RwLock<BTreeMap<String, ServiceRegistration>>,
    failing: AtomicBool,
}

impl FakeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every registry call fail until reset.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn put_service(&self, name: &str, instances: Vec<ServiceInstance>) {
        self.services.write().insert(name.to_string(), instances);
    }

    pub fn remove_service(&self, name: &str) {
        self.services.write().remove(name);
    }

    pub fn registration_count(&self) -> usize {
        self.registrations.read().len()
    }

    pub fn registration(&self, id: &str) -> Option<ServiceRegistration> {
        self.registrations.read().get(id).cloned()
    }

    fn fail_if_injected(&self) -> Result<(), RegistryError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(RegistryError::Status {
                status: 503,
                body: "injected failure".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl RegistryClient for FakeRegistry {
    async fn register(&self, record: &ServiceRegistration) -> Result<(), RegistryError> {
        self.fail_if_injected()?;
        self.registrations
            .write()
            .insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn deregister(&self, service_id: &str) -> Result<(), RegistryError> {
        self.fail_if_injected()?;
        self.registrations.write().remove(service_id);
        Ok(())
    }

    async fn list_service_names(&self) -> Result<BTreeSet<String>, RegistryError> {
        self.fail_if_injected()?;
        Ok(self.services.read().keys().cloned().collect())
    }

    async fn list_healthy_instances(
        &self,
        service_name: &str,
    ) -> Result<Vec<ServiceInstance>, RegistryError> {
        self.fail_if_injected()?;
        Ok(self
            .services
            .read()
            .get(service_name)
            .cloned()
            .unwrap_or_default())
    }
}

/// Build an instance the way the registry client would after a health query.
pub fn instance(
    id: &str,
    name: &str,
    address: &str,
    port: u16,
    meta: &[(&str, &str)],
) -> ServiceInstance {
    let meta: HashMap<String, String> = meta
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    ServiceInstance::from_registry(id.into(), name.into(), address.into(), port, vec![], meta)
}
