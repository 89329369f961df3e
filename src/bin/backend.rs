//! Backend service binary.
//!
//! With no `--config`, boots a zero-config demo: listen on 127.0.0.1:1002
//! (the address the frontend expects by default).

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;

use traceline::config::{load_config, AppConfig};
use traceline::observability::{logging, metrics};
use traceline::service;
use traceline::service::backend;

#[derive(Parser)]
#[command(name = "backend", about = "Demo backend service with trace propagation")]
struct Args {
    /// Path to a TOML config file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };
    if args.config.is_none() {
        // Zero-config demo wiring: stay off the frontend's default port.
        config.server.bind_address = "127.0.0.1:1002".to_string();
    }

    logging::init(&config.observability.log_filter);
    tracing::info!(bind_address = %config.server.bind_address, "backend starting");

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let router = backend::router(Duration::from_secs(config.server.request_timeout_secs));
    let listener = TcpListener::bind(&config.server.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");
    service::serve(router, listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
