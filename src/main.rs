//! Ride-sharing admin gateway.
//!
//! A thin reverse proxy in front of the ride-sharing backend. Dashboard
//! requests arrive under `/api/admin`, `/api/admin/action` and `/api/ai`,
//! are rewritten to canonical backend paths, stamped with an admin identity,
//! and relayed back unchanged.
//!
//! # Architecture Overview
//!
//! ```text
//!   Dashboard ──▶ http::server ──▶ routing (normalize → rewrite)
//!                                        │
//!                                        ▼
//!                              security (identity → headers)
//!                                        │
//!                                        ▼
//!   Dashboard ◀── http::response ◀── upstream (forward, deadline) ◀──▶ Backend
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use admin_gateway::config::{load_config, GatewayConfig};
use admin_gateway::lifecycle::{signals, Shutdown};
use admin_gateway::observability::{logging, metrics};
use admin_gateway::HttpServer;

#[derive(Parser, Debug)]
#[command(name = "admin-gateway", version, about = "Admin API gateway for the ride-sharing dashboard")]
struct Args {
    /// Path to the TOML configuration; built-in defaults when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override listener.bind_address
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }

    logging::init(&config.observability)?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "admin-gateway starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.base_url,
        upstream_timeout_secs = config.upstream.timeout_secs,
        request_timeout_secs = config.limits.request_timeout_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    let shutdown = Arc::new(Shutdown::new());
    let server = HttpServer::new(config)?;
    let stop = shutdown.subscribe();
    signals::spawn_signal_listener(shutdown);

    server.run(listener, stop).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
