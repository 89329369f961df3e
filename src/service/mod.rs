//! Demo services exercising the propagation core.
//!
//! Two axum applications share this library: `frontend` (takes external
//! traffic, offloads pool work, relays to the backend) and `backend`
//! (serves `/user`). Both install [`crate::http::TraceScopeLayer`] so every
//! request runs inside a trace scope.

pub mod backend;
pub mod frontend;

use axum::Router;
use tokio::net::TcpListener;

/// Serve `router` on `listener` until Ctrl+C.
pub async fn serve(router: Router, listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("HTTP server stopped");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received");
}
