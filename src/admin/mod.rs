//! Discovery API.
//!
//! Management and introspection surface over the registry, separate from
//! the proxy data path. Gateway-level routes live at the root; the
//! discovery-scoped mirror lives under `/discovery`.
//!
//! All writes are last-writer-wins per service name.

pub mod discovery;
pub mod handlers;
pub mod types;

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::http::server::AppState;

pub fn setup_admin_router() -> Router<AppState> {
    let discovery_routes = Router::new()
        .route(
            "/services",
            get(discovery::list_services).post(handlers::register_service),
        )
        .route(
            "/services/{name}",
            get(discovery::get_service).delete(handlers::unregister_service),
        )
        .route("/services/{name}/health", get(discovery::check_service_health))
        .route("/services/{name}/status", put(discovery::update_status))
        .route("/health/all", get(handlers::health_all))
        .route("/routes", get(discovery::list_routes));

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::gateway_health))
        .route("/health/all", get(handlers::health_all))
        .route("/services/status", get(handlers::services_status))
        .route("/services", post(handlers::register_service))
        .route("/services/{name}", delete(handlers::unregister_service))
        .nest("/discovery", discovery_routes)
}
