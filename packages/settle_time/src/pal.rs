//! Platform abstraction layer for reading the clock.
//!
//! Timing logic reads the time through [`PlatformFacade`], which dispatches either to the
//! real monotonic clock or, in tests, to a fake clock that only moves when told to.

mod abstractions;
mod facade;
#[cfg(test)]
mod fake;
mod real;

pub(crate) use abstractions::Platform;
pub(crate) use facade::PlatformFacade;
#[cfg(test)]
pub(crate) use fake::FakePlatform;
pub(crate) use real::RealPlatform;
