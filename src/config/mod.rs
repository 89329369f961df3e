//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks, all errors collected)
//!     → AppConfig (validated, immutable)
//!     → shared with the bootstrap code of each binary
//! ```
//!
//! # Design Decisions
//! - Every field has a default so a missing config file still boots a
//!   working demo pair
//! - Validation separates syntactic (serde) from semantic checks and
//!   returns all errors, not just the first

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{AppConfig, ServiceEntry};
