//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::pool::executor::PoolConfig;

/// Root configuration shared by the frontend and backend binaries.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP server settings.
    pub server: ServerConfig,

    /// Worker-pool sizing.
    pub pool: WorkerPoolConfig,

    /// Outbound HTTP client settings.
    pub client: ClientConfig,

    /// Logging and metrics settings.
    pub observability: ObservabilityConfig,

    /// Known services, name → base URL.
    pub services: Vec<ServiceEntry>,
}

/// HTTP server settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1:1001").
    pub bind_address: String,

    /// Per-request handler timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:1001".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Worker-pool sizing knobs.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkerPoolConfig {
    /// Workers kept alive indefinitely.
    pub core_workers: usize,

    /// Upper bound on workers under load.
    pub max_workers: usize,

    /// Idle lifetime in seconds for workers above the core size.
    pub keep_alive_secs: u64,

    /// Bounded queue capacity.
    pub queue_capacity: usize,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self {
            core_workers: 4,
            max_workers: 8,
            keep_alive_secs: 30,
            queue_capacity: 64,
        }
    }
}

impl WorkerPoolConfig {
    pub fn to_pool_config(&self) -> PoolConfig {
        PoolConfig {
            core_workers: self.core_workers,
            max_workers: self.max_workers,
            keep_alive: Duration::from_secs(self.keep_alive_secs),
            queue_capacity: self.queue_capacity,
        }
    }
}

/// Outbound HTTP client settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    /// End-to-end timeout in seconds for one outbound request.
    pub request_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 5,
        }
    }
}

/// Logging and metrics settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default tracing filter when RUST_LOG is unset.
    pub log_filter: String,

    /// Whether to expose a Prometheus endpoint.
    pub metrics_enabled: bool,

    /// Bind address for the Prometheus exporter.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_filter: "traceline=debug,tower_http=info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9100".to_string(),
        }
    }
}

/// One known service: logical name and where it lives.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceEntry {
    /// Logical name used by callers (e.g., "backend").
    pub name: String,

    /// Base URL (e.g., "http://127.0.0.1:1002").
    pub base_url: String,
}
