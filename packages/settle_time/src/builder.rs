use std::path::PathBuf;

use crate::pal::PlatformFacade;
use crate::target::validate;
use crate::{Profiler, PromiseType, Result};

/// Where [`Profiler::write_result()`] writes results unless configured otherwise.
pub const DEFAULT_OUTPUT_PATH: &str = "./output.json";

/// Which part of a continuation's life is attributed to it.
///
/// The clock of a continuation can start when it is registered or when the promise it is
/// registered on settles, and stop when the promise settles or when the continuation finishes
/// (including any future it returns).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[non_exhaustive]
pub enum Attribution {
    /// From registration until the continuation has finished.
    #[default]
    Completion,

    /// From registration until the promise it was registered on settles.
    ///
    /// The result is recorded before the continuation runs, so the continuation itself can
    /// already observe it.
    Settlement,

    /// From the promise it was registered on settling until the continuation has finished.
    Execution,
}

/// Creates a [`Profiler`] with a non-default configuration.
///
/// # Example
///
/// ```
/// use settle_time::{Attribution, Profiler};
/// use thenable::Runtime;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let runtime = Runtime::new(tokio::runtime::Handle::current());
///
/// let profiler = Profiler::builder()
///     .attribution(Attribution::Execution)
///     .output_path("timings.json")
///     .build(&runtime)
///     .unwrap();
///
/// assert_eq!(profiler.attribution(), Attribution::Execution);
/// # }
/// ```
#[derive(Debug)]
#[must_use]
pub struct ProfilerBuilder {
    attribution: Attribution,
    output_path: PathBuf,
    platform: PlatformFacade,
}

impl ProfilerBuilder {
    pub(crate) fn new() -> Self {
        Self {
            attribution: Attribution::default(),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            platform: PlatformFacade::real(),
        }
    }

    /// Sets which part of a continuation's life is attributed to it.
    ///
    /// Defaults to [`Attribution::Completion`].
    pub fn attribution(self, attribution: Attribution) -> Self {
        Self {
            attribution,
            ..self
        }
    }

    /// Sets the file [`Profiler::write_result()`] writes to.
    ///
    /// Defaults to [`DEFAULT_OUTPUT_PATH`].
    pub fn output_path(self, output_path: impl Into<PathBuf>) -> Self {
        Self {
            output_path: output_path.into(),
            ..self
        }
    }

    #[cfg(test)]
    pub(crate) fn platform(self, platform: PlatformFacade) -> Self {
        Self { platform, ..self }
    }

    /// Creates a profiler for the promises of `target`. Profiling is not started.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LibraryNotFound`][crate::Error::LibraryNotFound] if `target` has no
    /// prototype and [`Error::TypeMismatch`][crate::Error::TypeMismatch] if the promises it
    /// creates do not share that prototype.
    pub fn build<T>(self, target: &T) -> Result<Profiler>
    where
        T: PromiseType + ?Sized,
    {
        let prototype = validate(target)?;

        Ok(Profiler::new_inner(
            prototype,
            self.attribution,
            self.platform,
            self.output_path,
        ))
    }
}
