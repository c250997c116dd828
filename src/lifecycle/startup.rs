//! Startup orchestration.
//!
//! Configuration is loaded and validated first, then logging and metrics
//! come up, and the listener is bound last.

use tokio::net::TcpListener;

use crate::config::{GatewayConfig, ObservabilityConfig};
use crate::observability::{logging, metrics};

/// Install the tracing subscriber and, when enabled, the Prometheus exporter.
pub fn init_observability(config: &ObservabilityConfig) {
    logging::init(config);

    if !config.metrics_enabled {
        return;
    }
    match config.metrics_address.parse() {
        Ok(addr) => metrics::init_metrics(addr),
        Err(e) => tracing::error!(
            metrics_address = %config.metrics_address,
            error = %e,
            "Failed to parse metrics address"
        ),
    }
}

pub async fn bind(config: &GatewayConfig) -> std::io::Result<TcpListener> {
    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");
    Ok(listener)
}
