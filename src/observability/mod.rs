//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! handlers / pool / client produce:
//!     → logging.rs (tracing subscriber; spans carry trace_id)
//!     → metrics.rs (counters; Prometheus scrape endpoint)
//! ```
//!
//! # Design Decisions
//! - Log correlation works by opening a span with a `trace_id` field at
//!   every boundary (inbound request, pooled task); the fmt subscriber
//!   prints span fields on each event, so this module never formats the
//!   id itself
//! - Metrics are cheap counter increments and optional to expose

pub mod logging;
pub mod metrics;
