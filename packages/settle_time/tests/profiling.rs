//! End-to-end profiling of continuations registered on real promises.

use std::fs;
use std::path::Path;
use std::sync::mpsc::{self, TryRecvError};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use interpose::Interceptor;
use settle_time::{
    Attribution, DEFAULT_OUTPUT_PATH, Error, Profiler, ProfilingStatus, TimingReport,
};
use thenable::{RawPromise, Rejection, Runtime};
use tokio::runtime::Handle;
use tokio::time::sleep;

fn runtime() -> Runtime {
    Runtime::new(Handle::current())
}

#[tokio::test(flavor = "multi_thread")]
async fn then_continuation_includes_its_own_delay() {
    let runtime = runtime();
    let mut profiler = Profiler::new(&runtime).unwrap();
    profiler.start_profiling().unwrap();

    let doubled = runtime
        .resolve(21_i32)
        .then_async("double", |n| async move {
            sleep(Duration::from_millis(100)).await;
            Ok(n * 2)
        })
        .await
        .unwrap();

    assert_eq!(doubled, 42);
    assert!(profiler.profiler_result().get("double").unwrap() >= 100.0);
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_continuations_are_timed_independently() {
    let runtime = runtime();
    let mut profiler = Profiler::new(&runtime).unwrap();
    profiler.start_profiling().unwrap();

    let first = runtime.resolve(1_u8).then_async("first", |n| async move {
        sleep(Duration::from_millis(200)).await;
        Ok(n)
    });
    let second = runtime.resolve(2_u8).then_async("second", |n| async move {
        sleep(Duration::from_millis(100)).await;
        Ok(n)
    });

    let (first, second) = runtime.join((first, second)).await.unwrap();
    assert_eq!((first, second), (1, 2));

    let report = profiler.profiler_result();
    assert!(report.get("first").unwrap() >= 200.0);
    assert!(report.get("second").unwrap() >= 100.0);
}

#[tokio::test(flavor = "multi_thread")]
async fn spread_continuation_receives_positional_values() {
    let runtime = runtime();
    let mut profiler = Profiler::new(&runtime).unwrap();
    profiler.start_profiling().unwrap();

    let received = Arc::new(Mutex::new(None));
    let seen = Arc::clone(&received);

    let sum = runtime
        .resolve((3_i32, 4_i32))
        .spread("combine", move |a, b| {
            *seen.lock().unwrap() = Some((a, b));
            a + b
        })
        .await
        .unwrap();

    assert_eq!(sum, 7);
    assert_eq!(*received.lock().unwrap(), Some((3, 4)));
    assert!(profiler.profiler_result().get("combine").unwrap() >= 0.0);
}

#[tokio::test(flavor = "multi_thread")]
async fn reset_clears_results_and_later_settlements_repopulate() {
    let runtime = runtime();
    let mut profiler = Profiler::new(&runtime).unwrap();
    profiler.start_profiling().unwrap();

    runtime.resolve(1_u8).then("before", |n| n).await.unwrap();
    assert!(profiler.profiler_result().contains("before"));

    profiler.reset_profiler_result();
    assert!(profiler.profiler_result().is_empty());

    runtime.resolve(1_u8).then("after", |n| n).await.unwrap();

    let report = profiler.profiler_result();
    assert_eq!(report.names().collect::<Vec<_>>(), vec!["after"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn anonymous_continuations_leave_no_entry() {
    let runtime = runtime();
    let mut profiler = Profiler::new(&runtime).unwrap();
    profiler.start_profiling().unwrap();

    let value = runtime
        .resolve(5_u32)
        .then("", |n| n + 1)
        .then("named", |n| n * 2)
        .await
        .unwrap();

    assert_eq!(value, 12);

    let report = profiler.profiler_result();
    assert!(!report.contains(""));
    assert_eq!(report.names().collect::<Vec<_>>(), vec!["named"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn catch_continuation_on_rejected_promise_is_timed() {
    let runtime = runtime();
    let mut profiler = Profiler::new(&runtime).unwrap();
    profiler.start_profiling().unwrap();

    let recovered = runtime
        .reject::<String>(Rejection::msg("3"))
        .catch("handler", |rejection| rejection.message())
        .await
        .unwrap();

    assert_eq!(recovered, "3");
    assert!(profiler.profiler_result().contains("handler"));
}

#[tokio::test(flavor = "multi_thread")]
async fn spread_over_joined_promises_is_timed() {
    let runtime = runtime();
    let mut profiler = Profiler::new(&runtime).unwrap();
    profiler.start_profiling().unwrap();

    let joined = runtime.join((
        runtime.delay(Duration::from_millis(20), 1_i32),
        runtime.delay(Duration::from_millis(10), 2_i32),
    ));
    let total = joined.spread("promises", |a, b| a + b).await.unwrap();

    assert_eq!(total, 3);
    assert!(profiler.profiler_result().contains("promises"));
}

#[tokio::test(flavor = "multi_thread")]
async fn rejected_join_is_caught_and_timed() {
    let runtime = runtime();
    let mut profiler = Profiler::new(&runtime).unwrap();
    profiler.start_profiling().unwrap();

    let recovered = runtime
        .join((
            runtime.reject::<i32>(Rejection::msg("1")),
            runtime.reject::<i32>(Rejection::msg("2")),
        ))
        .spread("sum", |a, b| a + b)
        .catch("rejection", |rejection| {
            rejection.message().parse().unwrap_or_default()
        })
        .await
        .unwrap();

    assert!(recovered == 1 || recovered == 2);

    let report = profiler.profiler_result();
    assert!(report.contains("rejection"));
    // Skipped by the rejection, so it never finished.
    assert!(!report.contains("sum"));
}

#[tokio::test(flavor = "multi_thread")]
async fn then_followed_by_spread() {
    let runtime = runtime();
    let mut profiler = Profiler::new(&runtime).unwrap();
    profiler.start_profiling().unwrap();

    let product = runtime
        .resolve(3_i32)
        .then("pair", |n| (n, n + 1))
        .spread("multiply", |a, b| a * b)
        .await
        .unwrap();

    assert_eq!(product, 12);

    let report = profiler.profiler_result();
    assert!(report.contains("pair"));
    assert!(report.contains("multiply"));
}

#[tokio::test(flavor = "multi_thread")]
async fn repeated_start_does_not_double_wrap() {
    let runtime = runtime();
    let mut profiler = Profiler::new(&runtime).unwrap();

    assert_eq!(profiler.start_profiling().unwrap(), ProfilingStatus::Started);
    assert_eq!(
        profiler.start_profiling().unwrap(),
        ProfilingStatus::AlreadyProfiling
    );

    let value = runtime.resolve(2_u8).then("once", |n| n + 1).await.unwrap();

    assert_eq!(value, 3);
    assert_eq!(profiler.profiler_result().len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn stop_restores_original_registration() {
    let runtime = runtime();
    let mut profiler = Profiler::new(&runtime).unwrap();

    assert!(!profiler.stop_profiling());

    profiler.start_profiling().unwrap();
    assert!(profiler.stop_profiling());
    assert!(!profiler.stop_profiling());

    let value = runtime.resolve(1_u8).then("plain", |n| n).await.unwrap();

    assert_eq!(value, 1);
    assert!(profiler.profiler_result().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn registered_continuations_are_released_on_stop() {
    let runtime = runtime();
    let mut profiler = Profiler::new(&runtime).unwrap();
    profiler.start_profiling().unwrap();

    let (sender, receiver) = mpsc::channel();

    let value = runtime
        .resolve(1_u8)
        .then("send", move |n| {
            sender.send(n).unwrap();
            n
        })
        .await
        .unwrap();

    assert_eq!(value, 1);
    assert_eq!(receiver.try_recv(), Ok(1));
    // The interception still records the continuation, and with it the sender.
    assert_eq!(receiver.try_recv(), Err(TryRecvError::Empty));

    profiler.stop_profiling();

    assert_eq!(receiver.try_recv(), Err(TryRecvError::Disconnected));
    assert!(profiler.profiler_result().contains("send"));
}

#[tokio::test(flavor = "multi_thread")]
async fn second_profiler_on_same_runtime_is_rejected() {
    let runtime = runtime();
    let mut first = Profiler::new(&runtime).unwrap();
    let mut second = Profiler::new(&runtime).unwrap();

    first.start_profiling().unwrap();

    assert!(matches!(
        second.start_profiling(),
        Err(Error::AlreadyIntercepted(_))
    ));
    assert!(!second.is_profiling());
}

#[tokio::test(flavor = "multi_thread")]
async fn unrelated_interceptor_cannot_stack_on_profiled_slot() {
    let runtime = runtime();
    let prototype = Arc::clone(runtime.prototype());
    let mut profiler = Profiler::new(&runtime).unwrap();
    profiler.start_profiling().unwrap();

    let unrelated = Interceptor::new();
    let stacked = unrelated.intercept(prototype.then_method(), |promise: &RawPromise, call| {
        promise.chain(Some(call.into_args()), None)
    });

    assert!(matches!(
        stacked,
        Err(interpose::Error::AlreadyIntercepted { .. })
    ));

    profiler.stop_profiling();

    let after_stop = unrelated
        .intercept(prototype.then_method(), |promise: &RawPromise, call| {
            promise.chain(Some(call.into_args()), None)
        })
        .unwrap();

    let value = runtime.resolve(1_u8).then("after_stop", |n| n).await.unwrap();

    assert_eq!(value, 1);
    assert!(after_stop.is_active());
    assert_eq!(after_stop.call_count(), 1);
    assert!(profiler.profiler_result().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn settlement_result_is_visible_inside_spread_continuation() {
    let runtime = runtime();
    let mut profiler = Profiler::builder()
        .attribution(Attribution::Settlement)
        .build(&runtime)
        .unwrap();
    profiler.start_profiling().unwrap();

    let results = profiler.results().clone();
    let joined = runtime.join((
        runtime.delay(Duration::from_millis(20), 1_i32),
        runtime.delay(Duration::from_millis(10), 2_i32),
    ));

    let seen = joined
        .spread("promises", move |_, _| results.get().contains("promises"))
        .await
        .unwrap();

    assert!(seen);
}

#[tokio::test(flavor = "multi_thread")]
async fn execution_attribution_excludes_wait_for_settlement() {
    let runtime = runtime();
    let mut profiler = Profiler::builder()
        .attribution(Attribution::Execution)
        .build(&runtime)
        .unwrap();
    profiler.start_profiling().unwrap();

    runtime
        .delay(Duration::from_millis(300), 1_u8)
        .then("quick", |n| n)
        .await
        .unwrap();

    assert!(profiler.profiler_result().get("quick").unwrap() < 300.0);
}

#[tokio::test(flavor = "multi_thread")]
async fn written_results_read_back_identically() {
    let runtime = runtime();
    let directory = tempfile::tempdir().unwrap();
    let path = directory.path().join("output.json");
    let mut profiler = Profiler::new(&runtime).unwrap();
    profiler.start_profiling().unwrap();

    runtime.resolve(1_u8).then("first", |n| n).await.unwrap();
    runtime.resolve(2_u8).then("second", |n| n).await.unwrap();

    profiler.write_result_to_file(&path).await.unwrap();

    let written = fs::read_to_string(&path).unwrap();
    assert!(written.starts_with("{\n    \""), "{written}");

    let read = TimingReport::read_from_file(&path).await.unwrap();
    assert_eq!(read, profiler.profiler_result());
    assert_eq!(read.len(), 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn write_result_uses_configured_path() {
    let runtime = runtime();
    let directory = tempfile::tempdir().unwrap();
    let path = directory.path().join("configured.json");
    let profiler = Profiler::builder()
        .output_path(&path)
        .build(&runtime)
        .unwrap();

    profiler.write_result().await.unwrap();

    assert_eq!(
        TimingReport::read_from_file(&path).await.unwrap(),
        TimingReport::default()
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn default_output_path() {
    let runtime = runtime();
    let profiler = Profiler::new(&runtime).unwrap();

    assert_eq!(profiler.output_path(), Path::new(DEFAULT_OUTPUT_PATH));
    assert_eq!(DEFAULT_OUTPUT_PATH, "./output.json");
}

#[tokio::test(flavor = "multi_thread")]
async fn write_failure_surfaces() {
    let runtime = runtime();
    let directory = tempfile::tempdir().unwrap();
    let profiler = Profiler::new(&runtime).unwrap();

    let result = profiler
        .write_result_to_file(directory.path().join("no").join("such").join("dir.json"))
        .await;

    assert!(matches!(result, Err(Error::Io(_))));
}

#[test]
fn missing_library_is_reported() {
    let result = Profiler::new(&Runtime::try_current());

    assert!(matches!(result, Err(Error::LibraryNotFound)));
}
