//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize, env overrides)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → composition root builds registry, resolver, checker
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → server swaps the static route table
//! ```
//!
//! # Design Decisions
//! - All fields have defaults so the gateway runs with no file at all
//! - Environment wins over file (`PORT`, `<SERVICE>_URL`)
//! - Only routes are hot-reloaded; registry contents are runtime state

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{apply_env_overrides, load_config, load_with_env, ConfigError};
pub use schema::{
    GatewayConfig, HealthCheckConfig, ListenerConfig, ObservabilityConfig, ProxySettings,
    RouteConfig, ServiceConfig,
};
