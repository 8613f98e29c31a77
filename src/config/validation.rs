//! Configuration validation logic.

use url::Url;

use crate::config::schema::GatewayConfig;

/// Error type for configuration validation failures.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError(pub String);

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Validation error: {}", self.0)
    }
}

/// Validate a GatewayConfig for semantic correctness.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    // 1. The registry address must be a usable http(s) URL
    match Url::parse(&config.consul.address) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        Ok(url) => errors.push(ValidationError(format!(
            "consul.address has unsupported scheme '{}'",
            url.scheme()
        ))),
        Err(e) => errors.push(ValidationError(format!(
            "consul.address '{}' is not a valid URL: {}",
            config.consul.address, e
        ))),
    }

    // 2. Ports and intervals
    if config.consul.service_port == Some(0) {
        errors.push(ValidationError(
            "consul.service_port must be in 1..=65535".to_string(),
        ));
    }
    if config.consul.refresh_interval_secs == 0 {
        errors.push(ValidationError(
            "consul.refresh_interval_secs must be > 0".to_string(),
        ));
    }
    if config.consul.health_check_interval_secs == 0 {
        errors.push(ValidationError(
            "consul.health_check_interval_secs must be > 0".to_string(),
        ));
    }

    // 3. Route overrides must be absolute paths
    for (service, path) in &config.consul.service_route_mappings {
        if !path.starts_with('/') {
            errors.push(ValidationError(format!(
                "service_route_mappings.{} must start with '/', got '{}'",
                service, path
            )));
        }
    }

    // 4. Health check path must be absolute
    if !config.consul.health_check_path.starts_with('/') {
        errors.push(ValidationError(format!(
            "consul.health_check_path must start with '/', got '{}'",
            config.consul.health_check_path
        )));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
