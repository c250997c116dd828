//! Gateway errors and their HTTP translation.
//!
//! # Responsibilities
//! - Define the error taxonomy shared by forwarding and the Discovery API
//! - Map each error to an HTTP status code with a readable JSON body
//!
//! # Design Decisions
//! - Backend network failures surface as 502, failed liveness as 503
//! - Errors never escape a handler as a panic; everything becomes a response

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

pub type GatewayResult<T> = Result<T, GatewayError>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    /// No route or no registered service matches.
    #[error("{0}")]
    NotFound(String),

    /// The resolved service failed its health check.
    #[error("{0}")]
    ServiceUnavailable(String),

    /// Network-level failure talking to a backend.
    #[error("{0}")]
    BadGateway(String),

    /// Any other unexpected failure.
    #[error("{0}")]
    Internal(String),

    /// Malformed registration payload or invalid status value.
    #[error("{0}")]
    InvalidInput(String),
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Short machine-readable kind, used in the JSON body and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::NotFound(_) => "not_found",
            GatewayError::ServiceUnavailable(_) => "service_unavailable",
            GatewayError::BadGateway(_) => "bad_gateway",
            GatewayError::Internal(_) => "internal_error",
            GatewayError::InvalidInput(_) => "invalid_input",
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": self.kind(),
            "detail": self.to_string(),
        });
        (self.status_code(), Json(body)).into_response()
    }
}
