//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate service addresses, paths and prefixes
//! - Validate value ranges (timeouts > 0, listener address parses)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Routes may name services that are registered later at runtime, so
//!   unknown route targets are not an error

use std::collections::HashSet;
use std::net::SocketAddr;
use thiserror::Error;
use url::Url;

use crate::config::schema::GatewayConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid bind address '{0}'")]
    BindAddress(String),

    #[error("service name must not be empty")]
    EmptyServiceName,

    #[error("duplicate service '{0}'")]
    DuplicateService(String),

    #[error("service '{name}' has invalid base address '{address}': {reason}")]
    BaseAddress {
        name: String,
        address: String,
        reason: String,
    },

    #[error("{what} '{value}' must start with '/'")]
    RelativePath { what: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    ZeroValue(&'static str),

    #[error("proxy timeout ({proxy}s) must exceed health check timeout ({health}s)")]
    TimeoutOrder { proxy: u64, health: u64 },
}

/// Check that a base address is an absolute http URL with a host.
pub fn validate_base_address(address: &str) -> Result<(), String> {
    let url = Url::parse(address).map_err(|e| e.to_string())?;
    if url.scheme() != "http" {
        return Err(format!("unsupported scheme '{}'", url.scheme()));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err("missing host".to_string());
    }
    Ok(())
}

pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    let mut seen = HashSet::new();
    for service in &config.services {
        if service.name.trim().is_empty() {
            errors.push(ValidationError::EmptyServiceName);
        } else if !seen.insert(service.name.as_str()) {
            errors.push(ValidationError::DuplicateService(service.name.clone()));
        }
        if let Err(reason) = validate_base_address(&service.base_address) {
            errors.push(ValidationError::BaseAddress {
                name: service.name.clone(),
                address: service.base_address.clone(),
                reason,
            });
        }
        if !service.health_check_path.starts_with('/') {
            errors.push(ValidationError::RelativePath {
                what: "health check path",
                value: service.health_check_path.clone(),
            });
        }
    }

    for route in &config.routes {
        if !route.path_prefix.starts_with('/') {
            errors.push(ValidationError::RelativePath {
                what: "route prefix",
                value: route.path_prefix.clone(),
            });
        }
    }

    if config.health_check.timeout_secs == 0 {
        errors.push(ValidationError::ZeroValue("health_check.timeout_secs"));
    }
    if config.proxy.timeout_secs == 0 {
        errors.push(ValidationError::ZeroValue("proxy.timeout_secs"));
    }
    if config.proxy.max_body_bytes == 0 {
        errors.push(ValidationError::ZeroValue("proxy.max_body_bytes"));
    }
    if config.proxy.timeout_secs <= config.health_check.timeout_secs {
        errors.push(ValidationError::TimeoutOrder {
            proxy: config.proxy.timeout_secs,
            health: config.health_check.timeout_secs,
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{RouteConfig, ServiceConfig};

    #[test]
    fn default_config_is_valid() {
        assert_eq!(validate_config(&GatewayConfig::default()), Ok(()));
    }

    #[test]
    fn collects_every_error() {
        let mut config = GatewayConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.services.push(ServiceConfig::new("user-service", "http://dup:1"));
        config.services.push(ServiceConfig::new("ftp", "ftp://files:21"));
        config.routes.push(RouteConfig::new("api", "user-service"));
        config.health_check.timeout_secs = 40;

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::BindAddress("not-an-address".into())));
        assert!(errors.contains(&ValidationError::DuplicateService("user-service".into())));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::BaseAddress { name, .. } if name == "ftp")));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::RelativePath { value, .. } if value == "api")));
        assert!(errors.contains(&ValidationError::TimeoutOrder { proxy: 30, health: 40 }));
    }

    #[test]
    fn base_address_rules() {
        assert!(validate_base_address("http://localhost:8001").is_ok());
        assert!(validate_base_address("https://localhost:8001").is_err());
        assert!(validate_base_address("localhost:8001").is_err());
        assert!(validate_base_address("").is_err());
    }
}
