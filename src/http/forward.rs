//! Request forwarding.
//!
//! # Responsibilities
//! - Resolve the inbound path to a registered service
//! - Verify liveness before any payload leaves the gateway
//! - Rebuild the request for the backend and relay its response
//! - Translate failures into gateway errors
//!
//! # Request lifecycle
//! ```text
//! Received → Resolved ──────────────→ NotFound (404)
//!          → HealthChecked ─────────→ ServiceUnavailable (503)
//!          → Forwarded ─────────────→ BadGateway (502) | InternalError (500)
//!          → Relayed (success)
//! ```
//!
//! # Design Decisions
//! - Bodies are buffered inbound (byte-exact) and streamed outbound
//! - Response bodies are opaque unless JSON normalization is switched on
//! - Nothing is retried

use std::sync::Arc;
use std::time::{Duration, Instant};
use axum::body::{Body, Bytes};
use axum::http::{header, request, HeaderMap, Request, Uri};
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use hyper::body::Incoming;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::time;

use crate::config::GatewayConfig;
use crate::discovery::{join_url, ServiceEntry, ServiceRegistry};
use crate::health::HealthChecker;
use crate::http::request::request_id;
use crate::http::response::{GatewayError, GatewayResult};
use crate::observability::metrics;
use crate::routing::PathResolver;

/// Forwarding knobs derived from configuration.
#[derive(Debug, Clone)]
pub struct ForwardSettings {
    pub timeout: Duration,
    /// Limit for buffered bodies: inbound requests, and upstream responses
    /// when JSON normalization is on.
    pub max_body_bytes: usize,
    pub normalize_json: bool,
    pub cancel_on_disconnect: bool,
    /// How long a healthy registry status may stand in for a live probe.
    pub health_cache_ttl: Duration,
}

impl ForwardSettings {
    pub fn from_config(config: &GatewayConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.proxy.timeout_secs),
            max_body_bytes: config.proxy.max_body_bytes,
            normalize_json: config.proxy.normalize_json,
            cancel_on_disconnect: config.proxy.cancel_on_disconnect,
            health_cache_ttl: Duration::from_millis(config.health_check.cache_ttl_ms),
        }
    }
}

impl Default for ForwardSettings {
    fn default() -> Self {
        Self::from_config(&GatewayConfig::default())
    }
}

/// Relays inbound requests to resolved, healthy backends.
#[derive(Clone)]
pub struct ProxyForwarder {
    registry: Arc<ServiceRegistry>,
    resolver: Arc<PathResolver>,
    checker: HealthChecker,
    client: Client<HttpConnector, Body>,
    settings: ForwardSettings,
}

impl ProxyForwarder {
    pub fn new(
        registry: Arc<ServiceRegistry>,
        resolver: Arc<PathResolver>,
        checker: HealthChecker,
        settings: ForwardSettings,
    ) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Self {
            registry,
            resolver,
            checker,
            client,
            settings,
        }
    }

    pub fn settings(&self) -> &ForwardSettings {
        &self.settings
    }

    /// Forward `request` to the service owning its path.
    pub async fn forward(&self, request: Request<Body>) -> GatewayResult<Response> {
        let start = Instant::now();
        let method = request.method().to_string();
        let path = request.uri().path().to_string();
        let request_id = request_id(request.headers()).to_string();

        let mut service = None;
        let outcome = self.dispatch(request, &mut service).await;

        let service_label = service.as_deref().unwrap_or("none");
        match &outcome {
            Ok(response) => {
                metrics::record_request(&method, response.status().as_u16(), service_label, start);
                tracing::debug!(
                    request_id = %request_id,
                    service = %service_label,
                    status = %response.status(),
                    elapsed = ?start.elapsed(),
                    "Request relayed"
                );
            }
            Err(e) => {
                metrics::record_request(&method, e.status_code().as_u16(), service_label, start);
                tracing::warn!(
                    request_id = %request_id,
                    method = %method,
                    path = %path,
                    service = %service_label,
                    error = %e,
                    kind = e.kind(),
                    "Forwarding failed"
                );
            }
        }
        outcome
    }

    async fn dispatch(&self, request: Request<Body>, service: &mut Option<String>) -> GatewayResult<Response> {
        let path = request.uri().path();

        // 1. Resolve
        let name = self
            .resolver
            .resolve(path)
            .ok_or_else(|| GatewayError::NotFound(format!("No route for path '{}'", path)))?;
        *service = Some(name.clone());

        // 2. Look up
        let entry = self
            .registry
            .get(&name)
            .ok_or_else(|| GatewayError::NotFound(format!("Service '{}' is not registered", name)))?;

        // 3. Liveness
        self.ensure_live(&entry).await?;

        // 4. Rebuild
        let (parts, body) = request.into_parts();
        let body = axum::body::to_bytes(body, self.settings.max_body_bytes)
            .await
            .map_err(|e| GatewayError::InvalidInput(format!("Failed to read request body: {}", e)))?;
        let outbound = build_outbound(&parts, body, &entry.base_address)?;

        tracing::debug!(service = %entry.name, uri = %outbound.uri(), "Forwarding request");

        // 5. Issue
        let response = self.send(outbound, &entry.name).await?;

        // 6. Relay
        self.relay(response).await
    }

    async fn ensure_live(&self, entry: &ServiceEntry) -> GatewayResult<()> {
        if self.recently_healthy(entry) {
            return Ok(());
        }

        let result = self.checker.check(&self.registry, entry).await;
        if result.is_healthy() {
            Ok(())
        } else {
            Err(GatewayError::ServiceUnavailable(format!(
                "Service '{}' is unavailable",
                entry.name
            )))
        }
    }

    fn recently_healthy(&self, entry: &ServiceEntry) -> bool {
        if self.settings.health_cache_ttl.is_zero() || !entry.status.is_healthy() {
            return false;
        }
        match entry.last_checked_at {
            // A negative age (clock stepped back) counts as just checked.
            Some(at) => Utc::now()
                .signed_duration_since(at)
                .to_std()
                .map_or(true, |age| age <= self.settings.health_cache_ttl),
            None => false,
        }
    }

    async fn send(&self, request: Request<Body>, service: &str) -> GatewayResult<hyper::Response<Incoming>> {
        let timeout = self.settings.timeout;
        let call = time::timeout(timeout, self.client.request(request));

        let outcome = if self.settings.cancel_on_disconnect {
            call.await
        } else {
            // Detached: a dropped inbound connection does not abort the call.
            tokio::spawn(call)
                .await
                .map_err(|e| GatewayError::Internal(format!("Forwarding task failed: {}", e)))?
        };

        match outcome {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) => Err(GatewayError::BadGateway(format!(
                "Request to '{}' failed: {}",
                service, e
            ))),
            Err(_) => Err(GatewayError::BadGateway(format!(
                "Request to '{}' timed out after {:?}",
                service, timeout
            ))),
        }
    }

    async fn relay(&self, response: hyper::Response<Incoming>) -> GatewayResult<Response> {
        let (mut parts, body) = response.into_parts();

        if !(self.settings.normalize_json && is_json(&parts.headers)) {
            return Ok(Response::from_parts(parts, Body::new(body)));
        }

        let bytes = axum::body::to_bytes(Body::new(body), self.settings.max_body_bytes)
            .await
            .map_err(|e| {
                GatewayError::BadGateway(format!(
                    "Failed to read upstream body (limit {} bytes): {}",
                    self.settings.max_body_bytes, e
                ))
            })?;
        let normalized = normalize_json(bytes)?;

        parts.headers.remove(header::CONTENT_LENGTH);
        parts.headers.remove(header::TRANSFER_ENCODING);
        Ok(Response::from_parts(parts, Body::from(normalized)).into_response())
    }
}

/// Rebuild an inbound request for `base_address`: same method, path,
/// query and body; every header except `Host`.
pub fn build_outbound(parts: &request::Parts, body: Bytes, base_address: &str) -> GatewayResult<Request<Body>> {
    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let target = join_url(base_address, path_and_query);
    let uri: Uri = target
        .parse()
        .map_err(|e| GatewayError::Internal(format!("Invalid upstream URI '{}': {}", target, e)))?;

    let mut builder = Request::builder().method(parts.method.clone()).uri(uri);
    if let Some(headers) = builder.headers_mut() {
        for (name, value) in parts.headers.iter() {
            if name != header::HOST {
                headers.append(name.clone(), value.clone());
            }
        }
    }

    builder
        .body(Body::from(body))
        .map_err(|e| GatewayError::Internal(format!("Failed to build upstream request: {}", e)))
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map_or(false, |ct| ct.trim_start().to_ascii_lowercase().starts_with("application/json"))
}

/// Parse and re-serialize a JSON body. Empty bodies pass through.
fn normalize_json(bytes: Bytes) -> GatewayResult<Bytes> {
    if bytes.is_empty() {
        return Ok(bytes);
    }
    let value: serde_json::Value = serde_json::from_slice(&bytes)
        .map_err(|e| GatewayError::Internal(format!("Upstream returned invalid JSON: {}", e)))?;
    serde_json::to_vec(&value)
        .map(Bytes::from)
        .map_err(|e| GatewayError::Internal(format!("Failed to re-serialize JSON: {}", e)))
}
