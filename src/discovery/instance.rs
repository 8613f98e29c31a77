//! Normalized service instance representation.
//!
//! Registry instances carry free-form string metadata. Everything the
//! gateway routes on is derived from that metadata here, once, with
//! explicit defaults, so the rest of the control plane works with typed
//! fields only.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Meta key carrying the route path prefix for a service.
pub const META_PATH_PREFIX: &str = "pathPrefix";
/// Meta key carrying the load-balancing weight of an instance.
pub const META_WEIGHT: &str = "weight";
/// Meta key carrying the upstream URL scheme.
pub const META_SCHEME: &str = "scheme";
/// Meta key carrying the application protocol.
pub const META_PROTOCOL: &str = "protocol";
/// Meta key carrying the deployment environment label.
pub const META_ENVIRONMENT: &str = "environment";

/// Upstream URL scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }

    pub fn parse(s: &str) -> Option<Scheme> {
        match s {
            "http" => Some(Scheme::Http),
            "https" => Some(Scheme::Https),
            _ => None,
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Application protocol spoken by an upstream service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Http,
    Grpc,
    Websocket,
    Tcp,
    Udp,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Http => "http",
            Protocol::Grpc => "grpc",
            Protocol::Websocket => "websocket",
            Protocol::Tcp => "tcp",
            Protocol::Udp => "udp",
        }
    }

    pub fn parse(s: &str) -> Option<Protocol> {
        match s {
            "http" => Some(Protocol::Http),
            "grpc" => Some(Protocol::Grpc),
            "websocket" => Some(Protocol::Websocket),
            "tcp" => Some(Protocol::Tcp),
            "udp" => Some(Protocol::Udp),
            _ => None,
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One healthy backend instance of a named service.
///
/// The typed fields (`path_prefix`, `weight`, `scheme`, `protocol`) are
/// derived from `meta` at construction; `meta` itself is kept verbatim so
/// changes to advisory keys still show up in map diffs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceInstance {
    pub service_id: String,
    pub service_name: String,
    pub address: String,
    pub port: u16,
    pub tags: Vec<String>,
    pub meta: HashMap<String, String>,
    pub path_prefix: String,
    pub weight: u32,
    pub scheme: Scheme,
    pub protocol: Protocol,
}

impl ServiceInstance {
    /// Build an instance from raw registry fields.
    ///
    /// Discovery-side defaults: scheme https, protocol http, weight 1,
    /// empty path prefix. A non-numeric weight falls back to 1.
    pub fn from_registry(
        service_id: String,
        service_name: String,
        address: String,
        port: u16,
        tags: Vec<String>,
        meta: HashMap<String, String>,
    ) -> Self {
        let path_prefix = meta.get(META_PATH_PREFIX).cloned().unwrap_or_default();
        let weight = meta
            .get(META_WEIGHT)
            .and_then(|w| w.parse::<u32>().ok())
            .unwrap_or(1);
        let scheme = meta
            .get(META_SCHEME)
            .and_then(|s| Scheme::parse(s))
            .unwrap_or(Scheme::Https);
        let protocol = meta
            .get(META_PROTOCOL)
            .and_then(|p| Protocol::parse(p))
            .unwrap_or(Protocol::Http);

        Self {
            service_id,
            service_name,
            address,
            port,
            tags,
            meta,
            path_prefix,
            weight,
            scheme,
            protocol,
        }
    }

    /// The upstream URL for this instance.
    pub fn url(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.address, self.port)
    }
}
