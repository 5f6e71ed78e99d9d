//! Profiles a handful of labelled continuations and writes the timings to `./output.json`.
//!
//! Run with: `cargo run --example settle_time_basic`.

use std::error::Error;
use std::io;
use std::time::Duration;

use settle_time::Profiler;
use thenable::{Rejection, Runtime};
use tokio::runtime::Handle;
use tokio::time::sleep;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync + 'static>> {
    tracing_subscriber::fmt().with_writer(io::stderr).init();

    let runtime = Runtime::new(Handle::current());
    let mut profiler = Profiler::new(&runtime)?;

    profiler.start_profiling()?;

    let first = runtime.resolve(1).then_async("first", |n: i32| async move {
        sleep(Duration::from_millis(200)).await;
        Ok(n)
    });
    let second = runtime.resolve(2).then_async("second", |n: i32| async move {
        sleep(Duration::from_millis(100)).await;
        Ok(n)
    });
    let combined = runtime
        .join((first, second))
        .spread("combine", |a: i32, b: i32| a + b);
    let recovered = runtime
        .reject::<i32>(Rejection::msg("no value"))
        .catch("fallback", |_| 0);

    println!("combined: {}", combined.await?);
    println!("recovered: {}", recovered.await?);

    profiler.stop_profiling();

    print!("{}", profiler.profiler_result());

    profiler.write_result().await?;
    println!("Wrote timings to {}", profiler.output_path().display());

    Ok(())
}
