//! Shared utilities for integration testing: boot the real demo services
//! on ephemeral ports and return where they landed.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use traceline::discovery::ServiceRegistry;
use traceline::http::HttpClient;
use traceline::pool::{PoolConfig, TaskPool};
use traceline::service::backend;
use traceline::service::frontend::{self, FrontendState};

/// Start the backend service on an ephemeral port.
pub async fn start_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = backend::router(Duration::from_secs(5));
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

/// Start the frontend service wired to a backend at `backend_addr`.
#[allow(dead_code)]
pub async fn start_frontend(backend_addr: SocketAddr) -> SocketAddr {
    let registry = ServiceRegistry::new();
    registry.register(
        "backend",
        format!("http://{backend_addr}").parse().unwrap(),
    );
    let pool = Arc::new(TaskPool::new(PoolConfig::default()));
    let client = HttpClient::new(Arc::new(registry), Duration::from_secs(2));
    let router = frontend::router(
        FrontendState { pool, client },
        Duration::from_secs(5),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

/// An address nothing is listening on (bound briefly, then released).
#[allow(dead_code)]
pub fn dead_address() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// HTTP client without connection pooling, so each request is independent.
#[allow(dead_code)]
pub fn test_client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
