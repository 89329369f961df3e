//! Trace-id propagation across worker pools and HTTP service boundaries.

pub mod config;
pub mod discovery;
pub mod http;
pub mod observability;
pub mod pool;
pub mod resilience;
pub mod service;
pub mod trace;

pub use config::schema::AppConfig;
pub use pool::TaskPool;
pub use trace::TraceId;
