use std::any::type_name;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use interpose::{Interception, Interceptor};
use thenable::{OnFulfilled, OnRejected, OnSpread, Prototype, RawPromise};
use tracing::{debug, trace, warn};

use crate::pal::PlatformFacade;
use crate::timer::Timer;
use crate::{Attribution, ProfilerBuilder, PromiseType, Result, ResultSink, TimingReport};

/// What [`Profiler::start_profiling()`] did.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum ProfilingStatus {
    /// The registration slots were intercepted and continuations are now timed.
    Started,

    /// The profiler was already profiling, so nothing changed.
    AlreadyProfiling,
}

/// The three active interceptions of a profiling profiler.
struct Interceptions {
    then: Interception<RawPromise, OnFulfilled, RawPromise>,
    catch: Interception<RawPromise, OnRejected, RawPromise>,
    spread: Interception<RawPromise, OnSpread, RawPromise>,
}

impl Interceptions {
    fn restore(mut self) {
        self.then.restore();
        self.catch.restore();
        self.spread.restore();
    }
}

/// Times the labelled continuations registered on the promises of one promise library.
///
/// While profiling, every continuation registered through `then`, `catch` or `spread` on a
/// promise of the library is wrapped so that its elapsed time is recorded under its label.
/// Which part of the continuation's life counts is decided by the [`Attribution`] the profiler
/// was built with. Anonymous continuations run as usual but are never recorded.
///
/// Dropping a profiler stops profiling. The results survive stopping and restarting; only
/// [`reset_profiler_result()`][Self::reset_profiler_result] clears them.
///
/// # Example
///
/// ```
/// use std::time::Duration;
///
/// use settle_time::Profiler;
/// use thenable::Runtime;
///
/// # #[tokio::main(flavor = "multi_thread")]
/// # async fn main() {
/// let runtime = Runtime::new(tokio::runtime::Handle::current());
/// let mut profiler = Profiler::new(&runtime).unwrap();
///
/// profiler.start_profiling().unwrap();
///
/// let doubled = runtime
///     .resolve(21)
///     .then_async("double", |n: i32| async move {
///         tokio::time::sleep(Duration::from_millis(100)).await;
///         Ok(n * 2)
///     })
///     .await
///     .unwrap();
///
/// profiler.stop_profiling();
///
/// assert_eq!(doubled, 42);
/// assert!(profiler.profiler_result().get("double").unwrap() >= 100.0);
/// # }
/// ```
pub struct Profiler {
    prototype: Arc<Prototype>,
    interceptor: Interceptor,
    timer: Timer,
    output_path: PathBuf,

    // Either all three registration slots are intercepted or none is.
    interceptions: Option<Interceptions>,
}

impl Profiler {
    /// Creates a profiler with the default configuration for the promises of `target`.
    ///
    /// # Errors
    ///
    /// Fails like [`ProfilerBuilder::build()`].
    pub fn new<T>(target: &T) -> Result<Self>
    where
        T: PromiseType + ?Sized,
    {
        Self::builder().build(target)
    }

    /// Starts configuring a profiler.
    pub fn builder() -> ProfilerBuilder {
        ProfilerBuilder::new()
    }

    pub(crate) fn new_inner(
        prototype: Arc<Prototype>,
        attribution: Attribution,
        platform: PlatformFacade,
        output_path: PathBuf,
    ) -> Self {
        let interceptor = prototype.interceptor().clone();

        Self {
            prototype,
            interceptor,
            timer: Timer::new(attribution, platform, ResultSink::new()),
            output_path,
            interceptions: None,
        }
    }

    /// Starts timing continuations.
    ///
    /// Calling this while already profiling changes nothing and reports
    /// [`ProfilingStatus::AlreadyProfiling`].
    ///
    /// Every continuation registered while profiling is also kept in the call records of the
    /// slot interceptions until [`stop_profiling()`][Self::stop_profiling] (or drop). Whatever
    /// a continuation captures, such as the sender half of a channel, stays alive until then,
    /// and memory use grows with the number of registrations. Stop and restart profiling to
    /// release them in long sessions; the results are kept.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyIntercepted`][crate::Error::AlreadyIntercepted] if another
    /// party holds an interception of any of the registration slots. No slot is left
    /// intercepted by this profiler in that case.
    pub fn start_profiling(&mut self) -> Result<ProfilingStatus> {
        if self.interceptions.is_some() {
            debug!(prototype = %self.prototype.id(), "already profiling");
            return Ok(ProfilingStatus::AlreadyProfiling);
        }

        // A failure part way drops the interceptions made so far, which restores them.
        let interceptions = self.intercept_slots().inspect_err(|error| {
            warn!(prototype = %self.prototype.id(), %error, "cannot start profiling");
        })?;

        self.interceptions = Some(interceptions);

        debug!(
            prototype = %self.prototype.id(),
            attribution = ?self.timer.attribution(),
            "profiling started"
        );

        Ok(ProfilingStatus::Started)
    }

    fn intercept_slots(&self) -> Result<Interceptions> {
        let then = {
            let timer = self.timer.clone();

            self.interceptor
                .intercept(self.prototype.then_method(), move |promise: &RawPromise, call| {
                    trace!(ordinal = call.ordinal(), "then registration intercepted");
                    promise.chain(Some(timer.wrap(call.into_args())), None)
                })?
        };

        let catch = {
            let timer = self.timer.clone();

            self.interceptor
                .intercept(self.prototype.catch_method(), move |promise: &RawPromise, call| {
                    trace!(ordinal = call.ordinal(), "catch registration intercepted");
                    promise.chain(None, Some(timer.wrap(call.into_args())))
                })?
        };

        let spread = {
            let timer = self.timer.clone();

            self.interceptor
                .intercept(self.prototype.spread_method(), move |promise: &RawPromise, call| {
                    trace!(ordinal = call.ordinal(), "spread registration intercepted");
                    promise
                        .all()
                        .chain(Some(timer.wrap(call.into_args()).spread_over()), None)
                })?
        };

        Ok(Interceptions {
            then,
            catch,
            spread,
        })
    }

    /// Stops timing continuations, restoring the original registration behavior.
    ///
    /// Returns `false` and does nothing if the profiler is not profiling. Results are kept.
    pub fn stop_profiling(&mut self) -> bool {
        let Some(interceptions) = self.interceptions.take() else {
            return false;
        };

        interceptions.restore();

        debug!(prototype = %self.prototype.id(), "profiling stopped");

        true
    }

    /// Whether continuations are currently being timed.
    #[must_use]
    pub fn is_profiling(&self) -> bool {
        self.interceptions.is_some()
    }

    /// A snapshot of the elapsed time of every labelled continuation timed so far.
    #[must_use]
    pub fn profiler_result(&self) -> TimingReport {
        self.timer.sink().get()
    }

    /// Forgets every result recorded so far, without affecting whether profiling is on.
    pub fn reset_profiler_result(&self) {
        self.timer.sink().reset();
    }

    /// Writes a snapshot of the results to `path` as a JSON object indented by four spaces.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub async fn write_result_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        self.timer.sink().write_to_file(path).await
    }

    /// Writes a snapshot of the results to the configured output path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub async fn write_result(&self) -> Result<()> {
        self.write_result_to_file(&self.output_path).await
    }

    /// The results the profiler records into.
    ///
    /// Clone the sink to observe results from inside continuations.
    #[must_use]
    pub fn results(&self) -> &ResultSink {
        self.timer.sink()
    }

    /// Which part of a continuation's life is attributed to it.
    #[must_use]
    pub fn attribution(&self) -> Attribution {
        self.timer.attribution()
    }

    /// Where [`write_result()`][Self::write_result] writes to.
    #[must_use]
    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// The prototype whose registration slots the profiler intercepts.
    #[must_use]
    pub fn prototype(&self) -> &Arc<Prototype> {
        &self.prototype
    }
}

impl fmt::Debug for Profiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("prototype", &self.prototype.id())
            .field("attribution", &self.timer.attribution())
            .field("output_path", &self.output_path)
            .field("profiling", &self.is_profiling())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::time::Duration;

    use static_assertions::assert_impl_all;
    use thenable::Runtime;
    use tokio::runtime::Handle;

    use super::*;
    use crate::Error;
    use crate::pal::FakePlatform;

    assert_impl_all!(Profiler: Send, Sync);

    fn profiler(runtime: &Runtime, clock: &FakePlatform) -> Profiler {
        Profiler::builder()
            .platform(PlatformFacade::fake(clock.clone()))
            .build(runtime)
            .unwrap()
    }

    #[tokio::test]
    async fn start_is_idempotent() {
        let runtime = Runtime::new(Handle::current());
        let mut profiler = Profiler::new(&runtime).unwrap();

        assert_eq!(profiler.start_profiling().unwrap(), ProfilingStatus::Started);
        assert_eq!(
            profiler.start_profiling().unwrap(),
            ProfilingStatus::AlreadyProfiling
        );
        assert!(profiler.is_profiling());
        assert_eq!(runtime.prototype().interceptor().registry().len(), 3);
    }

    #[tokio::test]
    async fn stop_is_safe_when_idle_and_twice() {
        let runtime = Runtime::new(Handle::current());
        let mut profiler = Profiler::new(&runtime).unwrap();

        assert!(!profiler.stop_profiling());

        profiler.start_profiling().unwrap();
        assert!(profiler.stop_profiling());
        assert!(!profiler.stop_profiling());
        assert!(runtime.prototype().interceptor().registry().is_empty());
    }

    #[tokio::test]
    async fn conflicting_interception_rolls_back() {
        let runtime = Runtime::new(Handle::current());
        let prototype = Arc::clone(runtime.prototype());
        let _foreign = prototype
            .interceptor()
            .intercept(prototype.spread_method(), |promise: &RawPromise, call| {
                promise.all().chain(Some(call.into_args().spread_over()), None)
            })
            .unwrap();
        let mut profiler = Profiler::new(&runtime).unwrap();

        let result = profiler.start_profiling();

        assert!(matches!(result, Err(Error::AlreadyIntercepted(_))));
        assert!(!profiler.is_profiling());
        // Only the foreign interception remains.
        assert_eq!(prototype.interceptor().registry().len(), 1);
    }

    #[tokio::test]
    async fn interception_through_another_registry_rolls_back() {
        let runtime = Runtime::new(Handle::current());
        let prototype = Arc::clone(runtime.prototype());
        let _foreign = Interceptor::new()
            .intercept(prototype.catch_method(), |promise: &RawPromise, call| {
                promise.chain(None, Some(call.into_args()))
            })
            .unwrap();
        let mut profiler = Profiler::new(&runtime).unwrap();

        let result = profiler.start_profiling();

        assert!(matches!(result, Err(Error::AlreadyIntercepted(_))));
        assert!(!profiler.is_profiling());
        // The then slot was intercepted first and has been given back.
        assert!(!prototype.then_method().is_intercepted());
        assert!(prototype.catch_method().is_intercepted());
        assert!(prototype.interceptor().registry().is_empty());
    }

    #[tokio::test]
    async fn two_profilers_cannot_profile_same_runtime() {
        let runtime = Runtime::new(Handle::current());
        let mut first = Profiler::new(&runtime).unwrap();
        let mut second = Profiler::new(&runtime).unwrap();

        first.start_profiling().unwrap();
        assert!(second.start_profiling().is_err());

        first.stop_profiling();
        assert_eq!(second.start_profiling().unwrap(), ProfilingStatus::Started);
    }

    #[tokio::test]
    async fn drop_stops_profiling() {
        let runtime = Runtime::new(Handle::current());

        {
            let mut profiler = Profiler::new(&runtime).unwrap();
            profiler.start_profiling().unwrap();
        }

        assert!(runtime.prototype().interceptor().registry().is_empty());
    }

    #[tokio::test]
    async fn times_then_continuation_with_fake_clock() {
        let runtime = Runtime::new(Handle::current());
        let clock = FakePlatform::new();
        let mut profiler = profiler(&runtime, &clock);
        profiler.start_profiling().unwrap();

        let advancing = clock.clone();
        let result = runtime
            .resolve(21_i32)
            .then("double", move |n| {
                advancing.advance(Duration::from_millis(40));
                n * 2
            })
            .await
            .unwrap();

        assert_eq!(result, 42);
        assert_eq!(
            profiler.profiler_result().duration("double"),
            Some(Duration::from_millis(40))
        );
    }

    #[tokio::test]
    async fn results_survive_stop_and_reset_clears_them() {
        let runtime = Runtime::new(Handle::current());
        let clock = FakePlatform::new();
        let mut profiler = profiler(&runtime, &clock);

        profiler.start_profiling().unwrap();
        runtime.resolve(1_u8).then("kept", |n| n).await.unwrap();
        profiler.stop_profiling();

        assert!(profiler.profiler_result().contains("kept"));

        profiler.reset_profiler_result();
        assert!(profiler.profiler_result().is_empty());
        assert!(!profiler.is_profiling());
    }

    #[tokio::test]
    async fn continuations_registered_after_stop_are_not_timed() {
        let runtime = Runtime::new(Handle::current());
        let mut profiler = Profiler::new(&runtime).unwrap();

        profiler.start_profiling().unwrap();
        profiler.stop_profiling();

        runtime.resolve(1_u8).then("untimed", |n| n).await.unwrap();

        assert!(profiler.profiler_result().is_empty());
    }

    #[tokio::test]
    async fn debug_output_shows_state() {
        let runtime = Runtime::new(Handle::current());
        let profiler = Profiler::new(&runtime).unwrap();

        let debug = format!("{profiler:?}");

        assert!(debug.contains("profiling: false"), "{debug}");
        assert_eq!(profiler.output_path(), Path::new("./output.json"));
        assert!(Arc::ptr_eq(profiler.prototype(), runtime.prototype()));
    }
}
