//! Health probing.
//!
//! # Responsibilities
//! - Issue a bounded-timeout GET to a service's health path
//! - Classify the outcome: healthy iff the backend answers 200 in time
//! - Write results back to the registry and report aggregates
//!
//! # Design Decisions
//! - `probe` is always live; cached status lives only in the registry
//! - Failures are values, never errors: one dead service cannot abort
//!   a batch check
//! - Batch checks run concurrently; completion order is irrelevant

use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use serde::Serialize;
use tokio::time;

use crate::discovery::{ServiceEntry, ServiceRegistry, ServiceStatus};
use crate::observability::metrics;

const USER_AGENT: &str = "msa-gateway-health-check";

/// Outcome of a single probe.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthResult {
    pub status: ServiceStatus,
    /// Seconds until the backend answered; absent when it never did.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HealthResult {
    fn responded(status_code: StatusCode, elapsed: Duration) -> Self {
        let healthy = status_code == StatusCode::OK;
        Self {
            status: if healthy { ServiceStatus::Healthy } else { ServiceStatus::Unhealthy },
            response_time: Some(elapsed.as_secs_f64()),
            status_code: Some(status_code.as_u16()),
            error: None,
        }
    }

    fn failed(error: impl Into<String>) -> Self {
        Self {
            status: ServiceStatus::Unhealthy,
            response_time: None,
            status_code: None,
            error: Some(error.into()),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status.is_healthy()
    }

    /// True when the backend produced no HTTP response at all.
    pub fn is_unreachable(&self) -> bool {
        self.status_code.is_none()
    }
}

/// Aggregate of a batch check.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "total_services")]
    total: usize,
    #[serde(rename = "healthy_services")]
    healthy: usize,
    #[serde(rename = "unhealthy_services")]
    unhealthy: usize,
    pub results: BTreeMap<String, HealthResult>,
}

impl HealthReport {
    pub fn new(results: BTreeMap<String, HealthResult>) -> Self {
        let healthy = results.values().filter(|r| r.is_healthy()).count();
        Self {
            timestamp: Utc::now(),
            total: results.len(),
            healthy,
            unhealthy: results.len() - healthy,
            results,
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn healthy(&self) -> usize {
        self.healthy
    }

    pub fn unhealthy(&self) -> usize {
        self.unhealthy
    }
}

/// Probes backends over HTTP.
#[derive(Clone)]
pub struct HealthChecker {
    client: Client<HttpConnector, Body>,
    timeout: Duration,
}

impl HealthChecker {
    pub fn new(timeout: Duration) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Self { client, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Live probe with no side effects.
    pub async fn probe(&self, entry: &ServiceEntry) -> HealthResult {
        let url = entry.health_url();

        let request = match Request::builder()
            .method("GET")
            .uri(&url)
            .header("user-agent", USER_AGENT)
            .body(Body::empty())
        {
            Ok(req) => req,
            Err(e) => {
                tracing::error!(service = %entry.name, url = %url, error = %e, "Failed to build health check request");
                return HealthResult::failed(format!("invalid health check URL '{}': {}", url, e));
            }
        };

        let start = Instant::now();
        match time::timeout(self.timeout, self.client.request(request)).await {
            Ok(Ok(response)) => {
                let result = HealthResult::responded(response.status(), start.elapsed());
                if !result.is_healthy() {
                    tracing::warn!(service = %entry.name, status = %response.status(), "Health check failed: non-200 status");
                }
                result
            }
            Ok(Err(e)) => {
                tracing::warn!(service = %entry.name, url = %url, error = %e, "Health check failed: connection error");
                HealthResult::failed(format!("connection error: {}", e))
            }
            Err(_) => {
                tracing::warn!(service = %entry.name, url = %url, timeout = ?self.timeout, "Health check failed: timeout");
                HealthResult::failed(format!("timed out after {:?}", self.timeout))
            }
        }
    }

    /// Probe and persist the result into the registry.
    pub async fn check(&self, registry: &ServiceRegistry, entry: &ServiceEntry) -> HealthResult {
        let result = self.probe(entry).await;

        if let Some(previous) = registry.update_status_if(&entry.name, &entry.base_address, result.status) {
            if previous != result.status {
                tracing::info!(
                    service = %entry.name,
                    from = %previous,
                    to = %result.status,
                    "Service health changed"
                );
            }
        }
        metrics::record_service_health(&entry.name, result.is_healthy());

        result
    }

    /// Check every registered service concurrently.
    pub async fn check_all(&self, registry: &ServiceRegistry) -> HealthReport {
        let entries = registry.list();
        let checks = entries.values().map(|entry| async move {
            (entry.name.clone(), self.check(registry, entry).await)
        });

        let results: BTreeMap<String, HealthResult> = join_all(checks).await.into_iter().collect();
        let report = HealthReport::new(results);

        tracing::debug!(
            total = report.total(),
            healthy = report.healthy(),
            unhealthy = report.unhealthy(),
            "Health check round complete"
        );
        report
    }
}
