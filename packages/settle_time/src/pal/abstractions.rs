use std::fmt::Debug;
use std::time::Instant;

/// Provides the current time.
pub(crate) trait Platform: Debug + Send + Sync + 'static {
    /// Reads a monotonic clock.
    fn now(&self) -> Instant;
}
