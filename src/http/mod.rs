//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, route table)
//!     → request.rs (request ID, tracing span)
//!     → admin routes (Discovery API)  |  forward.rs (catch-all proxy)
//!     → response.rs (GatewayError → status code + JSON)
//!     → Send to client
//! ```

pub mod forward;
pub mod request;
pub mod response;
pub mod server;

pub use forward::{ForwardSettings, ProxyForwarder};
pub use request::X_REQUEST_ID;
pub use response::{GatewayError, GatewayResult};
pub use server::{AppState, HttpServer};
