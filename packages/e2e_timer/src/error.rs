use std::time::Duration;

use thiserror::Error;

/// Errors returned by timer handle operations.
///
/// These describe failures to reach the thread that owns the span tree. Errors that the caller
/// records on a span (via `stop()` or `end()`) are never returned here; they are observable
/// only through the query operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The owner of the span tree has exited, either because the timer was terminated or
    /// because the owner thread panicked. No further operations can be serviced.
    #[error("the timer owner has terminated and can no longer service requests")]
    Terminated,

    /// The owner did not accept the request or did not reply within the configured
    /// reply timeout.
    #[error("the timer owner did not respond within {timeout:?}")]
    TimedOut {
        /// The reply timeout configured on the timer.
        timeout: Duration,
    },
}

/// A specialized `Result` type for timer operations, returning the crate's
/// [`Error`] type as the error value.
pub type Result<T> = std::result::Result<T, Error>;
