//! Gateway-level endpoints: liveness, status snapshot, registration.

use std::collections::BTreeMap;
use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Path, Query, State},
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};

use crate::admin::types::{
    MessageResponse, RegisterQuery, RegisterRequest, RegisteredResponse, ServiceStatusView,
};
use crate::health::HealthReport;
use crate::http::response::{GatewayError, GatewayResult};
use crate::http::server::AppState;

pub async fn root() -> Json<Value> {
    Json(json!({
        "message": "MSA Gateway",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "endpoints": {
            "health": "/health",
            "services_status": "/services/status",
            "health_all": "/health/all",
            "register_service": "POST /services",
            "unregister_service": "DELETE /services/{name}",
            "discovery": "/discovery/services",
        }
    }))
}

/// The gateway's own liveness. Always healthy while it can answer.
pub async fn gateway_health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now(),
        "service": "msa-gateway",
    }))
}

/// Live check of every service, then a status snapshot.
pub async fn services_status(State(state): State<AppState>) -> Json<BTreeMap<String, ServiceStatusView>> {
    let report = state.checker.check_all(&state.registry).await;
    let entries = state.registry.list();

    let statuses = report
        .results
        .into_iter()
        .filter_map(|(name, result)| {
            // Skip services unregistered while the round was running.
            let entry = entries.get(&name)?;
            let view = ServiceStatusView {
                base_address: entry.base_address.clone(),
                status: entry.status,
                healthy: result.is_healthy(),
                last_checked_at: entry.last_checked_at,
            };
            Some((name, view))
        })
        .collect();

    Json(statuses)
}

/// Registration from a JSON body, query parameters, or both.
pub async fn register_service(
    State(state): State<AppState>,
    query: Result<Query<RegisterQuery>, QueryRejection>,
    body: Bytes,
) -> GatewayResult<Json<RegisteredResponse>> {
    let Query(query) = query.map_err(|e| GatewayError::InvalidInput(e.body_text()))?;
    let request = RegisterRequest::from_body(&body)?.with_query(query);
    let (registration, prefixes) = request.into_registration()?;
    let entry = state.register_service(registration, &prefixes)?;

    Ok(Json(RegisteredResponse {
        message: format!("Service {} registered", entry.name),
        service: entry,
    }))
}

pub async fn unregister_service(State(state): State<AppState>, Path(name): Path<String>) -> Json<MessageResponse> {
    state.unregister_service(&name);
    Json(MessageResponse::new(format!("Service {} unregistered", name)))
}

pub async fn health_all(State(state): State<AppState>) -> Json<HealthReport> {
    Json(state.checker.check_all(&state.registry).await)
}
