#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Measures how long labelled promise continuations take, without touching the code that
//! registers them.
//!
//! A [`Profiler`] intercepts the three continuation registration slots (`then`, `catch` and
//! `spread`) of the prototype shared by all promises of a [`thenable::Runtime`]. While
//! profiling, each continuation registered on any of those promises is wrapped so that its
//! elapsed time is recorded under its label. The latest duration per label is kept in a
//! [`ResultSink`], from which a [`TimingReport`] snapshot can be taken, reset or written to a
//! JSON file.
//!
//! Anonymous continuations (those with an empty label) run as usual but are never recorded.
//!
//! What counts as the elapsed time of a continuation is configurable through [`Attribution`].
//! By default it is the time from registration until the continuation has finished, including
//! any future it returns.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//!
//! use settle_time::{Profiler, TimingReport};
//! use thenable::Runtime;
//!
//! # #[tokio::main(flavor = "multi_thread")]
//! # async fn main() {
//! let runtime = Runtime::new(tokio::runtime::Handle::current());
//! let mut profiler = Profiler::new(&runtime).unwrap();
//!
//! profiler.start_profiling().unwrap();
//!
//! let first = runtime.resolve(1).then_async("first", |n: i32| async move {
//!     tokio::time::sleep(Duration::from_millis(200)).await;
//!     Ok(n)
//! });
//! let second = runtime.resolve(2).then_async("second", |n: i32| async move {
//!     tokio::time::sleep(Duration::from_millis(100)).await;
//!     Ok(n)
//! });
//! let combined = runtime
//!     .resolve((3, 4))
//!     .spread("combine", |a: i32, b: i32| a + b);
//!
//! assert_eq!(first.await.unwrap() + second.await.unwrap(), 3);
//! assert_eq!(combined.await.unwrap(), 7);
//!
//! profiler.stop_profiling();
//!
//! let report = profiler.profiler_result();
//! assert!(report.get("first").unwrap() >= 200.0);
//! assert!(report.get("second").unwrap() >= 100.0);
//! assert!(report.contains("combine"));
//!
//! let directory = tempfile::tempdir().unwrap();
//! let path = directory.path().join("output.json");
//!
//! profiler.write_result_to_file(&path).await.unwrap();
//! assert_eq!(TimingReport::read_from_file(&path).await.unwrap(), report);
//! # }
//! ```

mod builder;
mod error;
mod pal;
mod profiler;
mod report;
mod sink;
mod target;
mod timer;

pub use builder::{Attribution, DEFAULT_OUTPUT_PATH, ProfilerBuilder};
pub use error::Error;
pub(crate) use error::Result;
pub use profiler::{Profiler, ProfilingStatus};
pub use report::TimingReport;
pub use sink::ResultSink;
pub use target::PromiseType;

pub(crate) const ERR_POISONED_LOCK: &str = "encountered poisoned lock - continued execution is not safe because we can no longer ensure that we uphold security and privacy guarantees";
