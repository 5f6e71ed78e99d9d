//! Snapshots of timing results.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::io;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Serializer;
use serde_json::ser::PrettyFormatter;

use crate::Result;

const JSON_INDENT: &[u8] = b"    ";

/// Elapsed time per continuation label, in milliseconds.
///
/// A report is a snapshot: it does not change when more continuations are timed after it was
/// taken. Only the most recent duration is kept for each label.
///
/// Reports serialize to a flat JSON object that maps each label to its elapsed milliseconds.
///
/// # Example
///
/// ```
/// use settle_time::TimingReport;
///
/// let report = TimingReport::from_json(r#"{ "double": 101.5, "combine": 0.25 }"#).unwrap();
///
/// assert_eq!(report.get("double"), Some(101.5));
/// assert_eq!(report.names().collect::<Vec<_>>(), vec!["combine", "double"]);
/// ```
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TimingReport {
    elapsed_millis: BTreeMap<String, f64>,
}

impl TimingReport {
    pub(crate) fn from_durations(durations: &HashMap<String, Duration>) -> Self {
        Self {
            elapsed_millis: durations
                .iter()
                .map(|(label, elapsed)| (label.clone(), millis(*elapsed)))
                .collect(),
        }
    }

    /// The elapsed milliseconds recorded for `label`.
    #[must_use]
    pub fn get(&self, label: &str) -> Option<f64> {
        self.elapsed_millis.get(label).copied()
    }

    /// The elapsed time recorded for `label`.
    ///
    /// `None` if nothing is recorded for the label or the recorded value is not a valid
    /// duration, which is only possible for reports read from JSON.
    #[must_use]
    pub fn duration(&self, label: &str) -> Option<Duration> {
        let millis = self.get(label)?;

        Duration::try_from_secs_f64(millis / 1000.0).ok()
    }

    /// Whether anything is recorded for `label`.
    #[must_use]
    pub fn contains(&self, label: &str) -> bool {
        self.elapsed_millis.contains_key(label)
    }

    /// The number of labels in the report.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elapsed_millis.len()
    }

    /// Whether the report has no labels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elapsed_millis.is_empty()
    }

    /// The labels in the report, in lexicographic order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.elapsed_millis.keys().map(String::as_str)
    }

    /// The labels and their elapsed milliseconds, in lexicographic order of the labels.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.elapsed_millis
            .iter()
            .map(|(label, millis)| (label.as_str(), *millis))
    }

    /// Serializes the report as a JSON object indented by four spaces.
    ///
    /// # Errors
    ///
    /// Returns an error if the report cannot be represented as JSON.
    pub fn to_json(&self) -> Result<String> {
        let mut buffer = Vec::new();
        let mut serializer =
            Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(JSON_INDENT));

        self.serialize(&mut serializer)?;

        String::from_utf8(buffer)
            .map_err(|error| io::Error::new(io::ErrorKind::InvalidData, error).into())
    }

    /// Parses a report from a JSON object of labels and elapsed milliseconds.
    ///
    /// # Errors
    ///
    /// Returns an error if `json` is not such an object.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads a report previously written by
    /// [`Profiler::write_result_to_file()`][crate::Profiler::write_result_to_file].
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or does not contain a report.
    pub async fn read_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = tokio::fs::read_to_string(path).await?;

        Self::from_json(&json)
    }
}

fn millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

impl fmt::Display for TimingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            writeln!(f, "No continuation timings captured.")?;
        } else {
            writeln!(f, "Continuation timings:")?;
            for (label, millis) in self.iter() {
                writeln!(f, "  {label}: {millis:.3} ms")?;
            }
        }

        Ok(())
    }
}
