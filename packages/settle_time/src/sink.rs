use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::{debug, trace};

use crate::{ERR_POISONED_LOCK, Result, TimingReport};

/// The elapsed time of every timed continuation, keyed by continuation label.
///
/// All clones of a sink share the same results, so a clone can be moved into a continuation
/// to observe results while profiling is still going on.
///
/// A label that is timed again overwrites its earlier result. Anonymous continuations (with
/// an empty label) are never recorded.
#[derive(Clone, Debug, Default)]
pub struct ResultSink {
    results: Arc<Mutex<HashMap<String, Duration>>>,
}

impl ResultSink {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&self, label: &str, elapsed: Duration) {
        if label.is_empty() {
            return;
        }

        trace!(continuation = label, ?elapsed, "continuation timed");

        self.results
            .lock()
            .expect(ERR_POISONED_LOCK)
            .insert(label.to_string(), elapsed);
    }

    /// A snapshot of the results recorded so far.
    #[must_use]
    pub fn get(&self) -> TimingReport {
        TimingReport::from_durations(&self.results.lock().expect(ERR_POISONED_LOCK))
    }

    /// Forgets every result recorded so far.
    pub fn reset(&self) {
        self.results.lock().expect(ERR_POISONED_LOCK).clear();

        debug!("timing results reset");
    }

    /// Writes a snapshot of the results to `path` as a JSON object indented by four spaces,
    /// replacing the file if it exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub async fn write_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let report = self.get();

        tokio::fs::write(path, report.to_json()?).await?;

        debug!(path = %path.display(), entries = report.len(), "timing results written");

        Ok(())
    }
}
