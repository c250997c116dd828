//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Backend services registered at startup.
    pub services: Vec<ServiceConfig>,

    /// Static route rules mapping path prefixes to services.
    pub routes: Vec<RouteConfig>,

    /// Health check settings.
    pub health_check: HealthCheckConfig,

    /// Forwarding settings.
    pub proxy: ProxySettings,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            services: default_services(),
            routes: default_routes(),
            health_check: HealthCheckConfig::default(),
            proxy: ProxySettings::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".to_string(),
        }
    }
}

/// A backend service registered when the gateway starts.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ServiceConfig {
    /// Unique service name (registry key).
    pub name: String,

    /// Backend origin, e.g. "http://user-service:8001".
    pub base_address: String,

    /// Path probed for liveness.
    #[serde(default = "default_health_check_path")]
    pub health_check_path: String,

    /// Opaque caller-supplied metadata.
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl ServiceConfig {
    pub fn new(name: impl Into<String>, base_address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_address: base_address.into(),
            health_check_path: default_health_check_path(),
            metadata: BTreeMap::new(),
        }
    }

    /// Environment variable that overrides this service's base address.
    /// `user-service` maps to `USER_SERVICE_URL`.
    pub fn env_override_key(&self) -> String {
        format!("{}_URL", self.name.to_uppercase().replace(['-', '.'], "_"))
    }
}

pub fn default_health_check_path() -> String {
    "/health".to_string()
}

/// Route rule mapping a path prefix to a service.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct RouteConfig {
    /// Path prefix to match.
    pub path_prefix: String,

    /// Service name to forward to.
    pub service: String,
}

impl RouteConfig {
    pub fn new(path_prefix: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            path_prefix: path_prefix.into(),
            service: service.into(),
        }
    }
}

fn default_services() -> Vec<ServiceConfig> {
    vec![
        ServiceConfig::new("user-service", "http://user-service:8001"),
        ServiceConfig::new("order-service", "http://order-service:8002"),
        ServiceConfig::new("product-service", "http://product-service:8003"),
    ]
}

fn default_routes() -> Vec<RouteConfig> {
    vec![
        RouteConfig::new("/users", "user-service"),
        RouteConfig::new("/orders", "order-service"),
        RouteConfig::new("/products", "product-service"),
        RouteConfig::new("/api/users", "user-service"),
        RouteConfig::new("/api/orders", "order-service"),
        RouteConfig::new("/api/products", "product-service"),
    ]
}

/// Health check configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Health probe timeout in seconds.
    pub timeout_secs: u64,

    /// How long a healthy result may be reused by the forwarder, in milliseconds.
    /// Zero means every forwarded request probes live.
    pub cache_ttl_ms: u64,

    /// Background check interval in seconds. Zero disables the monitor.
    pub interval_secs: u64,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 5,
            cache_ttl_ms: 0,
            interval_secs: 0,
        }
    }
}

/// Forwarding configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProxySettings {
    /// Outbound request timeout in seconds.
    pub timeout_secs: u64,

    /// Maximum inbound body size in bytes.
    pub max_body_bytes: usize,

    /// Parse and re-serialize JSON response bodies instead of streaming them.
    pub normalize_json: bool,

    /// Drop the outbound call when the inbound connection goes away.
    pub cancel_on_disconnect: bool,
}

impl Default for ProxySettings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_body_bytes: 2 * 1024 * 1024, // 2MB
            normalize_json: false,
            cancel_on_disconnect: true,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON log lines instead of the human-readable format.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
