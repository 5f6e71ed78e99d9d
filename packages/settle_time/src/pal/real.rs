use std::time::Instant;

use crate::pal::Platform;

/// The monotonic clock of the operating system.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct RealPlatform;

impl Platform for RealPlatform {
    #[cfg_attr(test, mutants::skip)] // Real time cannot be asserted on precisely.
    fn now(&self) -> Instant {
        Instant::now()
    }
}
