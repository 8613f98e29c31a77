//! Externally reachable address resolution.
//!
//! The listener usually binds a wildcard (`0.0.0.0:8080`); the registry
//! needs an address peers can actually reach. This module substitutes
//! wildcard and loopback hosts with a concrete interface address, steered
//! by the configured preferred networks.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use regex::Regex;

use crate::config::ConsulConfig;
use crate::discovery::Scheme;

/// The `(host, port, scheme)` to advertise in the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAddress {
    pub host: String,
    pub port: u16,
    pub scheme: Scheme,
}

/// One preferred-network entry: always usable as a prefix, and as a regex
/// when it compiles as one.
struct NetworkMatcher {
    raw: String,
    pattern: Option<Regex>,
}

impl NetworkMatcher {
    fn matches(&self, candidate: &str) -> bool {
        candidate.starts_with(&self.raw)
            || self
                .pattern
                .as_ref()
                .is_some_and(|re| re.is_match(candidate))
    }
}

/// Picks the externally reachable address for this process.
pub struct AddressResolver {
    preferred: Vec<NetworkMatcher>,
}

impl AddressResolver {
    pub fn new(preferred_networks: &[String]) -> Self {
        let preferred = preferred_networks
            .iter()
            .map(|raw| NetworkMatcher {
                raw: raw.clone(),
                pattern: Regex::new(raw).ok(),
            })
            .collect();
        Self { preferred }
    }

    /// Resolve the address to advertise, given the listener's bound address.
    ///
    /// Explicit configuration wins; otherwise wildcard and loopback bound
    /// hosts are substituted with an interface address. A concrete
    /// non-loopback bound host is advertised as-is.
    pub fn resolve(&self, config: &ConsulConfig, bound: SocketAddr) -> ResolvedAddress {
        let port = config.service_port.unwrap_or_else(|| bound.port());
        let scheme = config.http_scheme;

        if let Some(host) = config.service_address.as_deref().filter(|h| !h.is_empty()) {
            return ResolvedAddress {
                host: host.to_string(),
                port,
                scheme,
            };
        }

        let bound_ip = bound.ip();
        let host = if bound_ip.is_unspecified() || bound_ip.is_loopback() {
            self.substitute()
        } else {
            bound_ip.to_string()
        };

        ResolvedAddress { host, port, scheme }
    }

    fn substitute(&self) -> String {
        let candidates = operational_ipv4();
        match self.pick(&candidates) {
            Some(ip) => ip.to_string(),
            None => {
                tracing::warn!(
                    "no operational non-loopback IPv4 interface; advertising 127.0.0.1"
                );
                Ipv4Addr::LOCALHOST.to_string()
            }
        }
    }

    /// First candidate matching a preferred network, else the first
    /// candidate, else None.
    fn pick(&self, candidates: &[Ipv4Addr]) -> Option<Ipv4Addr> {
        if self.preferred.is_empty() {
            return candidates.first().copied();
        }

        for ip in candidates {
            let text = ip.to_string();
            if self.preferred.iter().any(|m| m.matches(&text)) {
                return Some(*ip);
            }
        }
        candidates.first().copied()
    }
}

fn operational_ipv4() -> Vec<Ipv4Addr> {
    match if_addrs::get_if_addrs() {
        Ok(interfaces) => interfaces
            .into_iter()
            .filter(|iface| !iface.is_loopback())
            .filter_map(|iface| match iface.addr.ip() {
                IpAddr::V4(v4) => Some(v4),
                IpAddr::V6(_) => None,
            })
            .collect(),
        Err(e) => {
            tracing::warn!(error = %e, "failed to enumerate network interfaces");
            Vec::new()
        }
    }
}
