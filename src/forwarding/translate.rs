//! ServiceMap to forwarding-configuration translation.
//!
//! One route and one cluster per discovered service. Translation is pure:
//! the same map and overrides always produce the same routes and clusters.

use std::collections::{BTreeMap, HashMap};

use crate::discovery::{ServiceInstance, ServiceMap};
use crate::forwarding::cluster::{Cluster, Destination, LoadBalancingPolicy};
use crate::forwarding::route::{Route, CATCH_ALL_SEGMENT};

/// Build one route per service in the map.
///
/// Path resolution, first rule wins: configured override, then the first
/// instance's path prefix, then `/api/{service}/…`.
pub fn build_routes(map: &ServiceMap, overrides: &HashMap<String, String>) -> Vec<Route> {
    let mut routes = Vec::with_capacity(map.len());
    for (name, instances) in map.iter() {
        let first = &instances[0];
        routes.push(Route {
            route_id: format!("route-{name}"),
            cluster_id: format!("cluster-{name}"),
            path: route_path(name, instances, overrides),
            protocol: first.protocol,
        });
    }
    routes
}

/// Build one cluster per service in the map.
pub fn build_clusters(map: &ServiceMap) -> Vec<Cluster> {
    let mut clusters = Vec::with_capacity(map.len());
    for (name, instances) in map.iter() {
        let mut destinations = BTreeMap::new();
        for instance in instances {
            destinations.insert(
                destination_id(instance),
                Destination {
                    address: instance.url(),
                    weight: instance.weight,
                    protocol: instance.protocol,
                },
            );
        }
        clusters.push(Cluster {
            cluster_id: format!("cluster-{name}"),
            service_name: name.clone(),
            load_balancing_policy: LoadBalancingPolicy::RoundRobin,
            destinations,
        });
    }
    clusters
}

fn destination_id(instance: &ServiceInstance) -> String {
    format!(
        "{}-{}-{}-{}",
        instance.service_name, instance.address, instance.port, instance.service_id
    )
}

fn route_path(
    name: &str,
    instances: &[ServiceInstance],
    overrides: &HashMap<String, String>,
) -> String {
    if let Some(path) = overrides.get(name) {
        return path.clone();
    }

    let first = &instances[0];
    if instances
        .iter()
        .any(|i| i.path_prefix != first.path_prefix)
    {
        tracing::warn!(
            service = %name,
            "instances disagree on path prefix; using the first after sort"
        );
    }

    if !first.path_prefix.is_empty() {
        format!(
            "{}/{}",
            first.path_prefix.trim_end_matches('/'),
            CATCH_ALL_SEGMENT
        )
    } else {
        format!("/api/{name}/{CATCH_ALL_SEGMENT}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::ServiceMapBuilder;
    use crate::registry::{RegistryClient, RegistryError, ServiceRegistration};
    use async_trait::async_trait;
    use std::collections::{BTreeSet, HashSet};
    use std::sync::Arc;

    struct StaticRegistry {
        services: Vec<(String, Vec<ServiceInstance>)>,
    }

    #[async_trait]
    impl RegistryClient for StaticRegistry {
        async fn register(&self, _record: &ServiceRegistration) -> Result<(), RegistryError> {
            Ok(())
        }

        async fn deregister(&self, _service_id: &str) -> Result<(), RegistryError> {
            Ok(())
        }

        async fn list_service_names(&self) -> Result<BTreeSet<String>, RegistryError> {
            Ok(self.services.iter().map(|(n, _)| n.clone()).collect())
        }

        async fn list_healthy_instances(
            &self,
            service_name: &str,
        ) -> Result<Vec<ServiceInstance>, RegistryError> {
            Ok(self
                .services
                .iter()
                .find(|(n, _)| n == service_name)
                .map(|(_, i)| i.clone())
                .unwrap_or_default())
        }
    }

    fn instance(id: &str, name: &str, addr: &str, meta: &[(&str, &str)]) -> ServiceInstance {
        ServiceInstance::from_registry(
            id.into(),
            name.into(),
            addr.into(),
            8080,
            vec![],
            meta.iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    async fn map_of(services: Vec<(&str, Vec<ServiceInstance>)>) -> ServiceMap {
        let client = Arc::new(StaticRegistry {
            services: services
                .into_iter()
                .map(|(n, i)| (n.to_string(), i))
                .collect(),
        });
        ServiceMapBuilder::new(client, vec![]).build().await.unwrap()
    }

    #[tokio::test]
    async fn test_single_instance_route_and_cluster() {
        let map = map_of(vec![(
            "weather",
            vec![instance("w1", "weather", "10.0.0.5", &[("scheme", "https")])],
        )])
        .await;

        let routes = build_routes(&map, &HashMap::new());
        let clusters = build_clusters(&map);

        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].route_id, "route-weather");
        assert_eq!(routes[0].cluster_id, "cluster-weather");
        assert_eq!(routes[0].path, "/api/weather/{**catch-all}");

        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].cluster_id, "cluster-weather");
        assert_eq!(clusters[0].service_name, "weather");
        assert_eq!(
            clusters[0].load_balancing_policy,
            LoadBalancingPolicy::RoundRobin
        );
        let dest = &clusters[0].destinations["weather-10.0.0.5-8080-w1"];
        assert_eq!(dest.address, "https://10.0.0.5:8080");
    }

    #[tokio::test]
    async fn test_two_instances_share_one_cluster() {
        let map = map_of(vec![(
            "weather",
            vec![
                instance("w1", "weather", "10.0.0.5", &[]),
                instance("w2", "weather", "10.0.0.6", &[]),
            ],
        )])
        .await;

        let clusters = build_clusters(&map);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].destinations.len(), 2);
        assert!(clusters[0]
            .destinations
            .contains_key("weather-10.0.0.5-8080-w1"));
        assert!(clusters[0]
            .destinations
            .contains_key("weather-10.0.0.6-8080-w2"));
    }

    #[tokio::test]
    async fn test_path_prefix_from_meta() {
        let map = map_of(vec![(
            "weather",
            vec![instance(
                "w1",
                "weather",
                "10.0.0.5",
                &[("pathPrefix", "/v2/weather")],
            )],
        )])
        .await;

        let routes = build_routes(&map, &HashMap::new());
        assert_eq!(routes[0].path, "/v2/weather/{**catch-all}");
    }

    #[tokio::test]
    async fn test_configured_override_wins_over_meta() {
        let map = map_of(vec![(
            "weather",
            vec![instance(
                "w1",
                "weather",
                "10.0.0.5",
                &[("pathPrefix", "/v2/weather")],
            )],
        )])
        .await;

        let overrides = HashMap::from([("weather".to_string(), "/wx/{**catch-all}".to_string())]);
        let routes = build_routes(&map, &overrides);
        assert_eq!(routes[0].path, "/wx/{**catch-all}");
    }

    #[tokio::test]
    async fn test_ids_unique_and_routes_resolve() {
        let map = map_of(vec![
            (
                "weather",
                vec![
                    instance("w1", "weather", "10.0.0.5", &[]),
                    instance("w2", "weather", "10.0.0.6", &[]),
                ],
            ),
            ("billing", vec![instance("b1", "billing", "10.0.1.5", &[])]),
        ])
        .await;

        let routes = build_routes(&map, &HashMap::new());
        let clusters = build_clusters(&map);

        let route_ids: HashSet<&str> = routes.iter().map(|r| r.route_id.as_str()).collect();
        let cluster_ids: HashSet<&str> = clusters.iter().map(|c| c.cluster_id.as_str()).collect();
        assert_eq!(route_ids.len(), routes.len());
        assert_eq!(cluster_ids.len(), clusters.len());

        for route in &routes {
            assert!(cluster_ids.contains(route.cluster_id.as_str()));
        }
    }

    #[tokio::test]
    async fn test_destination_addresses_parse() {
        let map = map_of(vec![(
            "weather",
            vec![
                instance("w1", "weather", "10.0.0.5", &[("scheme", "http")]),
                instance("w2", "weather", "10.0.0.6", &[]),
            ],
        )])
        .await;

        for cluster in build_clusters(&map) {
            for dest in cluster.destinations.values() {
                let url = url::Url::parse(&dest.address).unwrap();
                assert!(matches!(url.scheme(), "http" | "https"));
                assert!(url.port().is_some());
            }
        }
    }
}
