//! Registry snapshots as normalized service maps.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::discovery::ServiceInstance;
use crate::registry::{RegistryClient, RegistryError};

/// Service name the registry reports for itself; never routed to.
pub const REGISTRY_SERVICE_NAME: &str = "consul";

/// An immutable snapshot of the registry at one instant.
///
/// Maps service name to its healthy instances, sorted by service id so
/// two builds over identical registry state compare equal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceMap {
    services: BTreeMap<String, Vec<ServiceInstance>>,
}

impl ServiceMap {
    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&[ServiceInstance]> {
        self.services.get(name).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<ServiceInstance>)> {
        self.services.iter()
    }

    /// Names whose entry differs between the two maps (added, removed, or
    /// changed in any instance field). Used for change logging.
    pub fn changed_services(&self, other: &ServiceMap) -> Vec<String> {
        let mut changed = Vec::new();
        for name in self.services.keys() {
            if self.services.get(name) != other.services.get(name) {
                changed.push(name.clone());
            }
        }
        for name in other.services.keys() {
            if !self.services.contains_key(name) {
                changed.push(name.clone());
            }
        }
        changed
    }
}

/// Builds a [`ServiceMap`] from the registry.
///
/// Pure relative to the registry responses: every call re-queries, nothing
/// is cached between builds.
pub struct ServiceMapBuilder {
    client: Arc<dyn RegistryClient>,
    allow_list: Vec<String>,
}

impl ServiceMapBuilder {
    pub fn new(client: Arc<dyn RegistryClient>, allow_list: Vec<String>) -> Self {
        Self { client, allow_list }
    }

    pub async fn build(&self) -> Result<ServiceMap, RegistryError> {
        let names = self.client.list_service_names().await?;

        let mut services = BTreeMap::new();
        for name in names {
            if name.eq_ignore_ascii_case(REGISTRY_SERVICE_NAME) {
                continue;
            }
            if !self.allowed(&name) {
                continue;
            }

            let mut instances = self.client.list_healthy_instances(&name).await?;
            if instances.is_empty() {
                continue;
            }
            instances.sort_by(|a, b| a.service_id.cmp(&b.service_id));
            services.insert(name, instances);
        }

        Ok(ServiceMap { services })
    }

    fn allowed(&self, name: &str) -> bool {
        self.allow_list.is_empty()
            || self
                .allow_list
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(name))
    }
}
