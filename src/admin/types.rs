//! Request and response bodies of the Discovery API.

use std::collections::BTreeMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::schema::default_health_check_path;
use crate::discovery::{Metadata, Registration, ServiceEntry, ServiceStatus};
use crate::health::HealthResult;
use crate::http::response::{GatewayError, GatewayResult};

/// Registration payload. `url` and `health_check` are accepted as aliases.
///
/// `name` and `base_address` may instead arrive as query parameters, see
/// [`RegisterQuery`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, alias = "url")]
    pub base_address: Option<String>,
    #[serde(default, alias = "health_check")]
    pub health_check_path: Option<String>,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub path_prefixes: Vec<String>,
}

/// Query-string registration: `?name=&url=&health_check=` on `/services`,
/// `?service_name=` alongside a JSON body on `/discovery/services`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterQuery {
    pub name: Option<String>,
    pub service_name: Option<String>,
    #[serde(alias = "base_address")]
    pub url: Option<String>,
    #[serde(alias = "health_check_path")]
    pub health_check: Option<String>,
}

impl RegisterRequest {
    /// Parse a request body. An empty body means every field comes from
    /// the query string.
    pub fn from_body(body: &[u8]) -> GatewayResult<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body)
            .map_err(|e| GatewayError::InvalidInput(format!("invalid registration body: {}", e)))
    }

    /// Fill fields missing from the body with query parameters. Body values win.
    pub fn with_query(mut self, query: RegisterQuery) -> Self {
        self.name = self.name.or(query.name).or(query.service_name);
        self.base_address = self.base_address.or(query.url);
        self.health_check_path = self.health_check_path.or(query.health_check);
        self
    }

    /// Validate and split into a registration plus its route prefixes.
    pub fn into_registration(self) -> GatewayResult<(Registration, Vec<String>)> {
        let name = self
            .name
            .ok_or_else(|| GatewayError::InvalidInput("missing field 'name'".into()))?;
        let base_address = self
            .base_address
            .ok_or_else(|| GatewayError::InvalidInput("missing field 'base_address' (or 'url')".into()))?;
        let status = match self.status.as_deref() {
            Some(raw) => raw.parse::<ServiceStatus>()?,
            None => ServiceStatus::Unknown,
        };
        if let Some(bad) = self.path_prefixes.iter().find(|p| !p.starts_with('/')) {
            return Err(GatewayError::InvalidInput(format!(
                "path prefix '{}' must start with '/'",
                bad
            )));
        }

        let registration = Registration::new(name, base_address)
            .with_health_check_path(self.health_check_path.unwrap_or_else(default_health_check_path))
            .with_metadata(self.metadata)
            .with_status(status);
        registration.validate()?;
        Ok((registration, self.path_prefixes))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusUpdate {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RegisteredResponse {
    pub message: String,
    pub service: ServiceEntry,
}

#[derive(Debug, Serialize)]
pub struct ServiceList {
    pub services: BTreeMap<String, ServiceEntry>,
    pub total: usize,
}

/// One row of `GET /services/status`.
#[derive(Debug, Serialize)]
pub struct ServiceStatusView {
    pub base_address: String,
    pub status: ServiceStatus,
    pub healthy: bool,
    pub last_checked_at: Option<DateTime<Utc>>,
}

/// Result of `GET /discovery/services/{name}/health`.
#[derive(Debug, Serialize)]
pub struct ServiceHealthView {
    pub service_name: String,
    #[serde(flatten)]
    pub result: HealthResult,
}
