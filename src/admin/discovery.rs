//! Discovery-scoped endpoints for operator tooling.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};

use crate::admin::types::{ServiceHealthView, ServiceList, StatusUpdate};
use crate::discovery::{ServiceEntry, ServiceStatus};
use crate::http::response::{GatewayError, GatewayResult};
use crate::http::server::AppState;
use crate::routing::RouteRule;

fn not_found(name: &str) -> GatewayError {
    GatewayError::NotFound(format!("Service '{}' not found", name))
}

pub async fn list_services(State(state): State<AppState>) -> Json<ServiceList> {
    let services = state.registry.list();
    Json(ServiceList {
        total: services.len(),
        services,
    })
}

pub async fn get_service(State(state): State<AppState>, Path(name): Path<String>) -> GatewayResult<Json<ServiceEntry>> {
    state.registry.get(&name).map(Json).ok_or_else(|| not_found(&name))
}

/// Live probe of one service; the result is persisted to the registry.
/// A probe that got no HTTP response at all is reported as 503.
pub async fn check_service_health(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> GatewayResult<Json<ServiceHealthView>> {
    let entry = state.registry.get(&name).ok_or_else(|| not_found(&name))?;
    let result = state.checker.check(&state.registry, &entry).await;

    if result.is_unreachable() {
        return Err(GatewayError::ServiceUnavailable(format!(
            "Service health check failed: {}",
            result.error.as_deref().unwrap_or("no response")
        )));
    }

    Ok(Json(ServiceHealthView {
        service_name: name,
        result,
    }))
}

pub async fn update_status(
    State(state): State<AppState>,
    Path(name): Path<String>,
    payload: Result<Json<StatusUpdate>, JsonRejection>,
) -> GatewayResult<Json<ServiceEntry>> {
    let Json(update) = payload.map_err(|e| GatewayError::InvalidInput(e.body_text()))?;
    let status: ServiceStatus = update.status.parse()?;

    state
        .registry
        .update_status(&name, status)
        .ok_or_else(|| not_found(&name))?;
    state.registry.get(&name).map(Json).ok_or_else(|| not_found(&name))
}

pub async fn list_routes(State(state): State<AppState>) -> Json<Vec<RouteRule>> {
    Json(state.resolver.table().rules().to_vec())
}
