//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build the composition root (registry, resolver, checker, forwarder)
//! - Create Axum Router with the Discovery API and the catch-all proxy
//! - Wire up middleware (tracing, limits, timeouts, request ID)
//! - Run background tasks (health monitor, route reloads)
//! - Serve until the shutdown broadcast fires

use std::sync::Arc;
use std::time::Duration;
use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::Response,
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::admin::setup_admin_router;
use crate::config::GatewayConfig;
use crate::discovery::{Registration, ServiceEntry, ServiceRegistry};
use crate::health::{HealthChecker, HealthMonitor};
use crate::http::forward::{ForwardSettings, ProxyForwarder};
use crate::http::request::{make_span, propagate_request_id_layer, set_request_id_layer};
use crate::http::response::{GatewayError, GatewayResult};
use crate::routing::PathResolver;

/// Slack on top of the proxy timeout before the whole request is abandoned.
const REQUEST_TIMEOUT_SLACK: Duration = Duration::from_secs(5);

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ServiceRegistry>,
    pub resolver: Arc<PathResolver>,
    pub checker: HealthChecker,
    pub forwarder: ProxyForwarder,
}

impl AppState {
    pub fn from_config(config: &GatewayConfig) -> Self {
        let registry = Arc::new(ServiceRegistry::from_config(&config.services));
        let resolver = Arc::new(PathResolver::new(&config.routes));
        let checker = HealthChecker::new(Duration::from_secs(config.health_check.timeout_secs));
        let forwarder = ProxyForwarder::new(
            registry.clone(),
            resolver.clone(),
            checker.clone(),
            ForwardSettings::from_config(config),
        );

        Self {
            registry,
            resolver,
            checker,
            forwarder,
        }
    }

    /// Register (or replace) a service together with its runtime routes.
    pub fn register_service(&self, registration: Registration, path_prefixes: &[String]) -> GatewayResult<ServiceEntry> {
        registration.validate()?;
        let name = registration.name.clone();
        self.registry.register(registration);
        self.resolver.register_routes(&name, path_prefixes);

        self.registry
            .get(&name)
            .ok_or_else(|| GatewayError::Internal(format!("Service '{}' vanished during registration", name)))
    }

    /// Remove a service and its runtime routes. Absent names are a no-op.
    pub fn unregister_service(&self, name: &str) -> Option<ServiceEntry> {
        self.resolver.remove_routes(name);
        self.registry.unregister(name)
    }
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: GatewayConfig) -> Self {
        let state = AppState::from_config(&config);
        let router = Self::build_router(&config, state.clone());
        Self {
            router,
            config,
            state,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let request_timeout = Duration::from_secs(config.proxy.timeout_secs) + REQUEST_TIMEOUT_SLACK;

        setup_admin_router()
            .route("/{*path}", any(proxy_handler))
            .with_state(state)
            .layer(RequestBodyLimitLayer::new(config.proxy.max_body_bytes))
            .layer(TimeoutLayer::new(request_timeout))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http().make_span_with(make_span))
            .layer(set_request_id_layer())
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// `config_updates` delivers reloaded configurations; only their routes
    /// are applied. The server drains and returns once `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<GatewayConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            services = self.state.registry.len(),
            routes = self.state.resolver.table().len(),
            "HTTP server starting"
        );

        if self.config.health_check.interval_secs > 0 {
            let monitor = HealthMonitor::new(
                self.state.registry.clone(),
                self.state.checker.clone(),
                Duration::from_secs(self.config.health_check.interval_secs),
            );
            tokio::spawn(monitor.run(shutdown.resubscribe()));
        }

        let resolver = self.state.resolver.clone();
        let mut reload_shutdown = shutdown.resubscribe();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    update = config_updates.recv() => match update {
                        Some(config) => resolver.replace_static(&config.routes),
                        None => break,
                    },
                    _ = reload_shutdown.recv() => break,
                }
            }
        });

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Shared state, for inspection and for seeding registrations.
    pub fn state(&self) -> &AppState {
        &self.state
    }
}

/// Catch-all proxy handler.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> GatewayResult<Response> {
    state.forwarder.forward(request).await
}
