//! Routing rules derived from discovered services.

use serde::Serialize;

use crate::discovery::Protocol;

/// Trailing pattern segment matching any remaining path.
pub const CATCH_ALL_SEGMENT: &str = "{**catch-all}";

/// One path-based routing rule selecting a cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Route {
    /// `route-{service_name}`.
    pub route_id: String,

    /// `cluster-{service_name}`; always resolvable in the same snapshot.
    pub cluster_id: String,

    /// Match pattern, e.g. `/api/weather/{**catch-all}`.
    pub path: String,

    /// Protocol of the service behind this route.
    pub protocol: Protocol,
}

impl Route {
    /// The literal path prefix this route matches on, with the catch-all
    /// segment and any trailing slash removed.
    pub fn prefix(&self) -> &str {
        let prefix = self
            .path
            .strip_suffix(CATCH_ALL_SEGMENT)
            .unwrap_or(&self.path);
        let prefix = prefix.trim_end_matches('/');
        if prefix.is_empty() {
            "/"
        } else {
            prefix
        }
    }

    /// Whether `request_path` falls under this route.
    pub fn matches(&self, request_path: &str) -> bool {
        let prefix = self.prefix();
        if prefix == "/" {
            return true;
        }
        request_path == prefix
            || request_path
                .strip_prefix(prefix)
                .is_some_and(|rest| rest.starts_with('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(path: &str) -> Route {
        Route {
            route_id: "route-weather".into(),
            cluster_id: "cluster-weather".into(),
            path: path.into(),
            protocol: Protocol::Http,
        }
    }

    #[test]
    fn test_prefix_strips_catch_all() {
        assert_eq!(route("/api/weather/{**catch-all}").prefix(), "/api/weather");
        assert_eq!(route("/v2/weather/{**catch-all}").prefix(), "/v2/weather");
        assert_eq!(route("/{**catch-all}").prefix(), "/");
    }

    #[test]
    fn test_matching_respects_segment_boundaries() {
        let r = route("/api/weather/{**catch-all}");
        assert!(r.matches("/api/weather"));
        assert!(r.matches("/api/weather/today"));
        assert!(!r.matches("/api/weatherman"));
        assert!(!r.matches("/api"));
    }

    #[test]
    fn test_root_route_matches_everything() {
        let r = route("/{**catch-all}");
        assert!(r.matches("/"));
        assert!(r.matches("/anything/at/all"));
    }
}
