//! Context-propagating worker pool.
//!
//! # Data Flow
//! ```text
//! caller task (context installed by http::extract)
//!     → TaskPool::spawn / submit
//!     → snapshot captured on the caller, job wrapped (wrapper.rs)
//!     → bounded queue / worker dispatch (executor.rs)
//!     → worker installs the snapshot, runs the body, slot torn down
//! ```
//!
//! # Design Decisions
//! - The snapshot is captured at submission time; caller-side mutations
//!   made after `submit` returns are invisible to the job
//! - Every submission path goes through the wrapper; there is no raw
//!   enqueue that could bypass propagation
//! - Saturation rejects instead of blocking the submitter

pub mod executor;
pub mod wrapper;

pub use executor::{PoolConfig, PoolError, TaskError, TaskHandle, TaskPool};
pub use wrapper::wrap;
