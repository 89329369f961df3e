//! Service discovery stand-in.
//!
//! A local name → base-URL table built from configuration. Real discovery
//! protocols and client-side load balancing live outside this repository;
//! the client only needs something that answers "where is service X".

pub mod registry;

pub use registry::ServiceRegistry;
