//! Platform abstraction trait definitions.

use std::fmt::Debug;
use std::time::Instant;

/// Supplies the timestamps and identifiers a timer needs from its environment.
pub(crate) trait Platform: Debug + Send + Sync + 'static {
    /// Returns the current monotonic timestamp.
    fn now(&self) -> Instant;

    /// Returns a process-unique correlation identifier for a new timer.
    fn new_correlation_id(&self) -> String;
}
