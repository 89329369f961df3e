//! Explicit fallback substitution for failed downstream calls.

use std::fmt::Display;

/// Substitute a fallback value for a failed call, logging the failure.
pub trait OrFallback<T, E> {
    /// Return the success value, or log the error and build a fallback
    /// from it. Runs on the calling task, so the current trace id is
    /// visible to both the log line and the fallback closure.
    fn or_fallback(self, fallback: impl FnOnce(&E) -> T) -> T;
}

impl<T, E: Display> OrFallback<T, E> for Result<T, E> {
    fn or_fallback(self, fallback: impl FnOnce(&E) -> T) -> T {
        match self {
            Ok(value) => value,
            Err(error) => {
                tracing::warn!(error = %error, "downstream call failed, using fallback");
                fallback(&error)
            }
        }
    }
}
