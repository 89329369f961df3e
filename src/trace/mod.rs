//! Trace-context subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request
//!     → http::extract (header or fresh id)
//!     → context scope installed around the handler
//!     → handler logs / submits pool work / makes outbound calls
//!         → pool::wrapper rehomes a snapshot onto the worker task
//!         → http::inject serializes the id onto outgoing requests
//!     → scope torn down when the handler future completes
//! ```
//!
//! # Design Decisions
//! - The carrier is a `tokio::task_local!` slot, not an OS-thread local:
//!   tokio multiplexes many logical tasks onto few threads, so thread
//!   identity is the wrong propagation key
//! - A slot exists only inside an explicit scope; every context operation
//!   outside a scope is a total no-op
//! - Snapshots are owned copies, never live references

pub mod context;
pub mod id;

pub use context::{ContextSnapshot, TRACE_ID_KEY};
pub use id::TraceId;
