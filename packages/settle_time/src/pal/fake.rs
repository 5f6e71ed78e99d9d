use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::pal::Platform;

#[derive(Debug)]
struct FakePlatformState {
    origin: Instant,
    elapsed: Duration,
}

/// A clock that stands still until a test moves it.
///
/// Clones share the same time, so a test can keep one clone and advance the time seen by
/// code that holds another.
#[derive(Clone, Debug)]
pub(crate) struct FakePlatform {
    state: Arc<Mutex<FakePlatformState>>,
}

impl FakePlatform {
    pub(crate) fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(FakePlatformState {
                origin: Instant::now(),
                elapsed: Duration::ZERO,
            })),
        }
    }

    /// Moves the clock forward by `duration`.
    pub(crate) fn advance(&self, duration: Duration) {
        let mut state = self
            .state
            .lock()
            .expect("FakePlatform state lock should not be poisoned");

        state.elapsed = state
            .elapsed
            .checked_add(duration)
            .expect("fake clock overflows Duration - this indicates an unrealistic scenario");
    }
}

impl Platform for FakePlatform {
    fn now(&self) -> Instant {
        let state = self
            .state
            .lock()
            .expect("FakePlatform state lock should not be poisoned");

        state
            .origin
            .checked_add(state.elapsed)
            .expect("fake clock overflows Instant - this indicates an unrealistic scenario")
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn stands_still_until_advanced() {
        let platform = FakePlatform::new();

        let first = platform.now();
        assert_eq!(platform.now(), first);

        platform.advance(Duration::from_millis(150));
        assert_eq!(platform.now().duration_since(first), Duration::from_millis(150));
    }

    #[test]
    fn clones_share_time() {
        let platform1 = FakePlatform::new();
        let platform2 = platform1.clone();
        let start = platform2.now();

        platform1.advance(Duration::from_millis(100));

        assert_eq!(platform2.now().duration_since(start), Duration::from_millis(100));
    }
}
