//! Multi-tenant application gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌───────────────────────────────────────────────────┐
//!                         │                     GATEWAY                       │
//!                         │                                                   │
//!   Client Request        │  ┌──────────┐   ┌──────────┐   ┌──────────────┐   │
//!   ──────────────────────┼─▶│ net      │──▶│ http     │──▶│ routing      │   │
//!   (HTTP / HTTPS / WS)   │  │ listeners│   │ pipeline │   │ host+path    │   │
//!                         │  └──────────┘   └────┬─────┘   └──────────────┘   │
//!                         │                      │  CORS: origin lookup       │
//!                         │                      ▼                            │
//!                         │                ┌──────────┐                       │
//!                         │                │ app      │ auth, may answer      │
//!                         │                │ handle() │ without proceeding    │
//!                         │                └────┬─────┘                       │
//!                         │                     │ proceed                     │
//!   Client Response       │  ┌──────────┐  ┌────▼─────┐                       │
//!   ◀─────────────────────┼──│ hooks    │◀─│ proxy    │◀──────────────────────┼── Upstream
//!                         │  │ rewrite  │  │ transport│                       │
//!                         │  └──────────┘  └──────────┘                       │
//!                         │                                                   │
//!                         │  config · observability (logs, metrics) · lifecycle│
//!                         └───────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use app_gateway::config::load_config;
use app_gateway::lifecycle::{signals, startup, Shutdown};
use app_gateway::observability::{logging, metrics, PrometheusMetrics};

#[derive(Parser)]
#[command(name = "app-gateway")]
#[command(about = "Routing and proxying gateway for multi-tenant HTTP applications", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "gateway.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    logging::init_logging(config.observability.log_format);

    tracing::info!(
        config = %cli.config.display(),
        server = %config.server,
        routes = config.routes.len(),
        apps = config.apps.len(),
        "app-gateway v0.1.0 starting"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let server = startup::start(&config, Arc::new(PrometheusMetrics)).await?;

    let shutdown = Shutdown::new();
    signals::shutdown_on_signal(shutdown.clone());

    server.run(&shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
