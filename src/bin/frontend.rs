//! Frontend service binary.
//!
//! With no `--config`, boots a zero-config demo: listen on 127.0.0.1:1001
//! and expect the backend binary on 127.0.0.1:1002.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;

use traceline::config::schema::ServiceEntry;
use traceline::config::{load_config, AppConfig};
use traceline::discovery::ServiceRegistry;
use traceline::http::HttpClient;
use traceline::observability::{logging, metrics};
use traceline::pool::TaskPool;
use traceline::service;
use traceline::service::frontend::{self, FrontendState};

#[derive(Parser)]
#[command(name = "frontend", about = "Demo frontend service with trace propagation")]
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
    if config.services.is_empty() {
        // Zero-config demo wiring.
        config.services.push(ServiceEntry {
            name: "backend".to_string(),
            base_url: "http://127.0.0.1:1002".to_string(),
        });
    }

    logging::init(&config.observability.log_filter);
    tracing::info!(
        bind_address = %config.server.bind_address,
        core_workers = config.pool.core_workers,
        max_workers = config.pool.max_workers,
        "frontend starting"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let registry = Arc::new(ServiceRegistry::from_config(&config.services)?);
    let pool = Arc::new(TaskPool::new(config.pool.to_pool_config()));
    let client = HttpClient::new(
        registry,
        Duration::from_secs(config.client.request_timeout_secs),
    );

    let router = frontend::router(
        FrontendState {
            pool: pool.clone(),
            client,
        },
        Duration::from_secs(config.server.request_timeout_secs),
    );

    let listener = TcpListener::bind(&config.server.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");
    service::serve(router, listener).await?;

    pool.shutdown().await;
    tracing::info!("Shutdown complete");
    Ok(())
}
