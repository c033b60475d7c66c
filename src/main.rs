//! h2-pool
//!
//! Connects to the configured HTTP/2 target, keeps the backend set in sync
//! with DNS and shuts down cleanly on SIGINT/SIGTERM.
//!
//! # Architecture Overview
//!
//! ```text
//!   config.toml ──▶ ProxyConfig
//!                        │
//!                        ▼
//!   ┌──────────┐   ┌──────────────┐   ┌───────────────┐
//!   │ resolver │──▶│ConnectionPool│──▶│ load_balancer │
//!   │  (DNS)   │   │ + reconciler │   │ none/rr/random│
//!   └──────────┘   └──────┬───────┘   └───────────────┘
//!                         │
//!                         ▼
//!                  Http2Transport ──▶ Backends
//! ```

use std::path::PathBuf;

use clap::Parser;

use h2_pool::config::load_config;
use h2_pool::lifecycle::{signals, Shutdown};
use h2_pool::net::Http2Transport;
use h2_pool::observability::{logging, metrics};
use h2_pool::ConnectionPool;

const DEFAULT_CONFIG: &str = "/etc/h2-pool/config.toml";

#[derive(Parser)]
#[command(name = "h2-pool", about = "HTTP/2 backend connection pool", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, env = "H2_POOL_CONFIG", default_value = DEFAULT_CONFIG)]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    logging::init(&config.observability.log_level);
    tracing::info!(
        config = %cli.config.display(),
        target_host = %config.target_host,
        target_port = config.target_port,
        balancer = %config.dns.balancer,
        "h2-pool v0.1.0 starting"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();
    let transport = Http2Transport::new(config.timeouts.connect_timeout());
    let pool = ConnectionPool::connect(&config, transport, shutdown.subscribe()).await?;
    tracing::info!(backends = ?pool.addresses().await, "Serving");

    let signal = signals::wait_for_signal().await?;
    tracing::info!(signal, "Signal received, shutting down");
    shutdown.trigger();
    pool.wait_closed().await;

    tracing::info!("Shutdown complete");
    Ok(())
}
