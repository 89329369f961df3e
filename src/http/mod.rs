//! HTTP boundary for trace propagation.
//!
//! # Data Flow
//! ```text
//! Inbound request
//!     → extract.rs (header → context scope around the handler)
//!     → application handler (logs, pool work, outbound calls)
//!     → response (id echoed back in the header)
//!
//! Outbound request
//!     → client.rs (resolve service, enforce timeout)
//!     → inject.rs (current id → request header)
//!     → wire
//! ```

pub mod client;
pub mod extract;
pub mod inject;

pub use client::{ClientError, HttpClient};
pub use extract::{TraceScope, TraceScopeLayer};
pub use inject::{inject_trace_id, PropagateTrace, PropagateTraceLayer};

/// Wire header carrying the trace id, lowercase for HTTP/2 compatibility.
pub const TRACE_ID_HEADER: &str = "x-trace-id";
