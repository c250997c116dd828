//! MSA API Gateway
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http server ──▶ routing (longest prefix) ──▶ discovery registry
//!                          │                                            │
//!                          │                                   health gate (live probe)
//!                          │                                            │
//!     Client Response      ▼                                            ▼
//!     ◀────────────── relay response ◀──────────── forward ◀──── backend service
//!
//!     Discovery API (/services, /discovery/*) ──▶ registry + routes
//!     Health monitor (optional) ──▶ periodic probes ──▶ registry status
//! ```

use std::path::PathBuf;
use clap::Parser;

use msa_gateway::config::{load_with_env, watcher::ConfigWatcher};
use msa_gateway::lifecycle::{signals, startup};
use msa_gateway::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "msa-gateway")]
#[command(about = "API gateway for a set of HTTP microservices", long_about = None)]
struct Args {
    /// TOML configuration file. Built-in defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_with_env(args.config.as_deref())?;

    startup::init_observability(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "msa-gateway starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        services = config.services.len(),
        routes = config.routes.len(),
        health_timeout_secs = config.health_check.timeout_secs,
        proxy_timeout_secs = config.proxy.timeout_secs,
        "Configuration loaded"
    );

    // Route changes in the file are hot-reloaded; the watcher must stay alive.
    let (config_updates, _watcher) = match &args.config {
        Some(path) => {
            let (watcher, rx) = ConfigWatcher::new(path);
            (rx, Some(watcher.run()?))
        }
        None => (tokio::sync::mpsc::unbounded_channel().1, None),
    };

    let listener = startup::bind(&config).await?;
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        signals::wait_for_signal().await;
        shutdown.trigger();
    });

    HttpServer::new(config).run(listener, config_updates, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
