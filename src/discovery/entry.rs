//! Service entries and their health status.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::schema::{default_health_check_path, ServiceConfig};
use crate::config::validation::validate_base_address;
use crate::http::response::GatewayError;

/// Opaque caller-supplied key/value data attached to a service.
pub type Metadata = BTreeMap<String, serde_json::Value>;

/// Last known health of a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    #[default]
    Unknown,
    Healthy,
    Unhealthy,
}

impl ServiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceStatus::Unknown => "unknown",
            ServiceStatus::Healthy => "healthy",
            ServiceStatus::Unhealthy => "unhealthy",
        }
    }

    pub fn is_healthy(&self) -> bool {
        matches!(self, ServiceStatus::Healthy)
    }
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceStatus {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unknown" => Ok(ServiceStatus::Unknown),
            "healthy" => Ok(ServiceStatus::Healthy),
            "unhealthy" => Ok(ServiceStatus::Unhealthy),
            other => Err(GatewayError::InvalidInput(format!(
                "invalid status '{}', expected one of: unknown, healthy, unhealthy",
                other
            ))),
        }
    }
}

/// One backend as seen by the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceEntry {
    pub name: String,
    pub base_address: String,
    pub health_check_path: String,
    pub status: ServiceStatus,
    pub last_checked_at: Option<DateTime<Utc>>,
    pub metadata: Metadata,
}

impl ServiceEntry {
    /// Full URL probed by the health checker.
    pub fn health_url(&self) -> String {
        join_url(&self.base_address, &self.health_check_path)
    }
}

/// Concatenate an origin and a path without doubling the slash.
pub fn join_url(base: &str, path_and_query: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path_and_query)
}

/// Input to [`ServiceRegistry::register`](crate::discovery::ServiceRegistry::register).
#[derive(Debug, Clone, PartialEq)]
pub struct Registration {
    pub name: String,
    pub base_address: String,
    pub health_check_path: String,
    pub metadata: Metadata,
    pub status: ServiceStatus,
}

impl Registration {
    pub fn new(name: impl Into<String>, base_address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_address: base_address.into(),
            health_check_path: default_health_check_path(),
            metadata: Metadata::new(),
            status: ServiceStatus::Unknown,
        }
    }

    pub fn with_health_check_path(mut self, path: impl Into<String>) -> Self {
        self.health_check_path = path.into();
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_status(mut self, status: ServiceStatus) -> Self {
        self.status = status;
        self
    }

    pub fn validate(&self) -> Result<(), GatewayError> {
        if self.name.trim().is_empty() {
            return Err(GatewayError::InvalidInput("service name must not be empty".into()));
        }
        validate_base_address(&self.base_address).map_err(|reason| {
            GatewayError::InvalidInput(format!(
                "invalid base address '{}': {}",
                self.base_address, reason
            ))
        })?;
        if !self.health_check_path.starts_with('/') {
            return Err(GatewayError::InvalidInput(format!(
                "health check path '{}' must start with '/'",
                self.health_check_path
            )));
        }
        Ok(())
    }

    pub(crate) fn into_entry(self) -> ServiceEntry {
        ServiceEntry {
            name: self.name,
            base_address: self.base_address,
            health_check_path: self.health_check_path,
            status: self.status,
            last_checked_at: None,
            metadata: self.metadata,
        }
    }
}

impl From<&ServiceConfig> for Registration {
    fn from(config: &ServiceConfig) -> Self {
        Registration::new(config.name.clone(), config.base_address.clone())
            .with_health_check_path(config.health_check_path.clone())
            .with_metadata(config.metadata.clone())
    }
}
