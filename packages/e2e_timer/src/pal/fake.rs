//! Fake platform implementation for testing.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::pal::abstractions::Platform;

/// Internal state for the fake platform that can be shared between clones.
#[derive(Debug)]
struct FakePlatformState {
    elapsed: Duration,
    next_id: u64,
}

/// Fake implementation of the platform abstraction for testing.
///
/// The clock starts at a fixed origin and only moves when [`advance()`][Self::advance] is
/// called. Correlation identifiers are sequential. Multiple clones of the same `FakePlatform`
/// share state, so a test can keep one clone and advance time while a timer and its owner
/// thread hold others.
#[derive(Clone, Debug)]
pub(crate) struct FakePlatform {
    origin: Instant,
    state: Arc<Mutex<FakePlatformState>>,
}

impl FakePlatform {
    /// Creates a new fake platform with the clock at its origin.
    pub(crate) fn new() -> Self {
        Self {
            origin: Instant::now(),
            state: Arc::new(Mutex::new(FakePlatformState {
                elapsed: Duration::ZERO,
                next_id: 1,
            })),
        }
    }

    /// Moves the clock forward for this platform and all its clones.
    pub(crate) fn advance(&self, by: Duration) {
        let mut state = self
            .state
            .lock()
            .expect("FakePlatform state lock should not be poisoned");

        state.elapsed = state.elapsed.saturating_add(by);
    }
}

impl Platform for FakePlatform {
    fn now(&self) -> Instant {
        let elapsed = self
            .state
            .lock()
            .expect("FakePlatform state lock should not be poisoned")
            .elapsed;

        self.origin
            .checked_add(elapsed)
            .expect("fake clock advanced beyond the range of Instant")
    }

    fn new_correlation_id(&self) -> String {
        let mut state = self
            .state
            .lock()
            .expect("FakePlatform state lock should not be poisoned");

        let id = state.next_id;
        state.next_id = id.wrapping_add(1);

        format!("fake-{id:04}")
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn clock_stands_still_until_advanced() {
        let platform = FakePlatform::new();

        assert_eq!(platform.now(), platform.now());
    }

    #[test]
    fn advance_moves_clock() {
        let platform = FakePlatform::new();
        let before = platform.now();

        platform.advance(Duration::from_millis(40));

        assert_eq!(
            platform.now().duration_since(before),
            Duration::from_millis(40)
        );
    }

    #[test]
    fn shared_state_between_clones() {
        let platform1 = FakePlatform::new();
        let platform2 = platform1.clone();
        let before = platform2.now();

        platform1.advance(Duration::from_millis(5));

        assert_eq!(
            platform2.now().duration_since(before),
            Duration::from_millis(5)
        );
        assert_eq!(platform1.new_correlation_id(), "fake-0001");
        assert_eq!(platform2.new_correlation_id(), "fake-0002");
    }
}
