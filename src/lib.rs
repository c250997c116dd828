//! MSA API Gateway Library
//!
//! A single public entry point for a set of backend services: requests are
//! matched to a service by longest path prefix, gated on the service's
//! health, and forwarded. A Discovery API manages the service registry at
//! runtime.

pub mod admin;
pub mod config;
pub mod discovery;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
