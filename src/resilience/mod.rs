//! Resilience helpers for downstream calls.
//!
//! Fallback substitution is an explicit `Result` combinator, not hidden
//! dispatch: the caller makes the downstream call, gets a `Result`, and
//! explicitly chooses the fallback value on failure. The fallback closure
//! runs synchronously on the same task, so the trace id installed for the
//! failed attempt is still current for fallback logging.

pub mod fallback;

pub use fallback::OrFallback;
