//! Shared, observable state of one extraction run.

use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// Lifecycle of an extraction run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtractionStatus {
    /// Nothing has been started.
    #[default]
    Idle,
    /// The run is resolving its query.
    Initializing,
    /// A dependent run is paging through the primary query.
    FetchingPrimary,
    /// A dependent run is issuing secondary query batches.
    FetchingSecondary,
    /// A plain run is paging through its query.
    Paginating,
    /// The run is active between phases.
    Running,
    /// Records are being merged or written out.
    Processing,
    /// Finished with data.
    Completed,
    /// Stopped by an error.
    Failed,
    /// Stopped on request.
    Cancelled,
}

impl ExtractionStatus {
    /// Returns `true` for `Completed`, `Failed` and `Cancelled`.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Returns `true` while a run is in flight.
    #[must_use]
    pub const fn is_active(self) -> bool {
        !self.is_terminal() && !matches!(self, Self::Idle)
    }
}

impl std::fmt::Display for ExtractionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Initializing => "initializing",
            Self::FetchingPrimary => "fetching-primary",
            Self::FetchingSecondary => "fetching-secondary",
            Self::Paginating => "paginating",
            Self::Running => "running",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Severity of a log line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Progress.
    Info,
    /// Non-fatal problem.
    Warn,
    /// Fatal problem.
    Error,
}

/// A timestamped line of the run log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    /// When the line was written.
    pub timestamp: DateTime<Utc>,
    /// Severity.
    pub level: LogLevel,
    /// Message text.
    pub message: String,
}

impl std::fmt::Display for LogEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] {}",
            self.timestamp.format("%Y-%m-%dT%H:%M:%S%.3fZ"),
            self.message
        )
    }
}

/// A point-in-time copy of an extraction's state.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionSnapshot {
    /// Current status.
    pub status: ExtractionStatus,
    /// Percent complete, 0 to 100.
    pub progress: u8,
    /// Records handled so far in the current phase.
    pub records_processed: usize,
    /// Records expected in the current phase.
    pub total_records: usize,
    /// The full log, oldest first.
    pub log: Vec<LogEntry>,
    /// Final records; set only once completed.
    pub data: Option<Vec<Value>>,
    /// File the final records were written to.
    pub output_path: Option<PathBuf>,
    /// Failure message, if failed.
    pub error: Option<String>,
    /// When the run started.
    pub started_at: Option<DateTime<Utc>>,
    /// When the run reached a terminal status.
    pub finished_at: Option<DateTime<Utc>>,
}

impl ExtractionSnapshot {
    /// The most recent log line.
    #[must_use]
    pub fn latest_log(&self) -> Option<&LogEntry> {
        self.log.last()
    }
}

/// Handle to the state of one run. Clones share the same state.
///
/// Progress never decreases and stays below 100 until [`complete`](Self::complete).
/// Every log line is also emitted through `tracing`.
#[derive(Clone, Debug, Default)]
pub struct ExtractionTracker {
    inner: Arc<RwLock<ExtractionSnapshot>>,
}

impl ExtractionTracker {
    /// Creates an idle tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, ExtractionSnapshot> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ExtractionSnapshot> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Clears all state and moves to `Initializing`.
    pub fn reset(&self) {
        *self.write() = ExtractionSnapshot {
            status: ExtractionStatus::Initializing,
            started_at: Some(Utc::now()),
            ..ExtractionSnapshot::default()
        };
    }

    /// Returns a copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> ExtractionSnapshot {
        self.read().clone()
    }

    /// Returns the current status.
    #[must_use]
    pub fn status(&self) -> ExtractionStatus {
        self.read().status
    }

    /// Returns the current progress.
    #[must_use]
    pub fn progress(&self) -> u8 {
        self.read().progress
    }

    /// Moves to a non-terminal status. Ignored once the run is terminal.
    pub fn set_status(&self, status: ExtractionStatus) {
        let mut state = self.write();
        if !state.status.is_terminal() {
            state.status = status;
        }
    }

    /// Raises progress to `percent`. Lower values are ignored and values of
    /// 100 or more are held at 99 until the run completes.
    pub fn set_progress(&self, percent: u8) {
        let mut state = self.write();
        state.progress = state.progress.max(percent.min(99));
    }

    /// Updates the processed/total record counters.
    pub fn set_records(&self, processed: usize, total: usize) {
        let mut state = self.write();
        state.records_processed = processed;
        state.total_records = total;
    }

    /// Appends an info line.
    pub fn info(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!("{}", message);
        self.push_log(LogLevel::Info, message);
    }

    /// Appends a warning line.
    pub fn warn(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!("{}", message);
        self.push_log(LogLevel::Warn, message);
    }

    /// Appends an error line.
    pub fn error(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::error!("{}", message);
        self.push_log(LogLevel::Error, message);
    }

    fn push_log(&self, level: LogLevel, message: String) {
        self.write().log.push(LogEntry {
            timestamp: Utc::now(),
            level,
            message,
        });
    }

    /// Finishes the run with its records at 100%.
    pub fn complete(&self, data: Vec<Value>, output_path: Option<PathBuf>) {
        let count = data.len();
        {
            let mut state = self.write();
            state.status = ExtractionStatus::Completed;
            state.progress = 100;
            state.records_processed = count;
            state.total_records = count;
            state.data = Some(data);
            state.output_path = output_path;
            state.finished_at = Some(Utc::now());
        }
        self.info(format!("Extraction completed with {count} records"));
    }

    /// Finishes the run as failed.
    pub fn fail(&self, message: impl Into<String>) {
        let message = message.into();
        self.error(format!("Extraction failed: {message}"));
        let mut state = self.write();
        state.status = ExtractionStatus::Failed;
        state.error = Some(message);
        state.finished_at = Some(Utc::now());
    }

    /// Finishes the run as cancelled.
    pub fn cancelled(&self) {
        self.warn("Extraction cancelled");
        let mut state = self.write();
        state.status = ExtractionStatus::Cancelled;
        state.finished_at = Some(Utc::now());
    }

    /// Drops the in-memory records of a finished run. The saved file and
    /// counts are kept.
    pub fn release_data(&self) {
        let mut state = self.write();
        if state.status.is_terminal() {
            state.data = None;
        }
    }
}

const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ExtractionTracker>();
};

/// Maps a phase's own 0-100 progress into a slice of the overall range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProgressRange {
    start: u8,
    end: u8,
}

impl ProgressRange {
    /// The whole range.
    pub const FULL: Self = Self { start: 0, end: 100 };

    /// Creates a range. `end` is raised to `start` if smaller and both are
    /// capped at 100.
    #[must_use]
    pub fn new(start: u8, end: u8) -> Self {
        let start = start.min(100);
        Self {
            start,
            end: end.clamp(start, 100),
        }
    }

    /// Maps `local` (0-100) into this range, rounding down.
    #[must_use]
    pub fn map(self, local: u8) -> u8 {
        let span = u32::from(self.end - self.start);
        let offset = span * u32::from(local.min(100)) / 100;
        // offset <= span <= 100, so the sum fits
        self.start + u8::try_from(offset).unwrap_or(self.end - self.start)
    }
}

impl Default for ProgressRange {
    fn default() -> Self {
        Self::FULL
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reset_starts_initializing_with_empty_state() {
        let tracker = ExtractionTracker::new();
        tracker.info("old line");
        tracker.set_progress(40);

        tracker.reset();
        let snapshot = tracker.snapshot();

        assert_eq!(snapshot.status, ExtractionStatus::Initializing);
        assert_eq!(snapshot.progress, 0);
        assert!(snapshot.log.is_empty());
        assert!(snapshot.data.is_none());
        assert!(snapshot.started_at.is_some());
    }

    #[test]
    fn test_progress_is_monotonic_and_held_below_100() {
        let tracker = ExtractionTracker::new();
        tracker.set_progress(30);
        tracker.set_progress(20);
        assert_eq!(tracker.progress(), 30);

        tracker.set_progress(100);
        assert_eq!(tracker.progress(), 99);

        tracker.complete(vec![json!({"id": 1})], None);
        assert_eq!(tracker.progress(), 100);
    }

    #[test]
    fn test_terminal_status_is_sticky() {
        let tracker = ExtractionTracker::new();
        tracker.reset();
        tracker.fail("boom");
        tracker.set_status(ExtractionStatus::Paginating);

        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.status, ExtractionStatus::Failed);
        assert_eq!(snapshot.error.as_deref(), Some("boom"));
        assert_eq!(
            snapshot.latest_log().unwrap().message,
            "Extraction failed: boom"
        );
        assert_eq!(snapshot.latest_log().unwrap().level, LogLevel::Error);
    }

    #[test]
    fn test_release_data_only_touches_finished_runs() {
        let tracker = ExtractionTracker::new();
        tracker.reset();
        tracker.release_data();
        tracker.complete(vec![json!({"id": 1})], Some(PathBuf::from("products_1.json")));
        tracker.release_data();

        let snapshot = tracker.snapshot();
        assert!(snapshot.data.is_none());
        assert_eq!(snapshot.records_processed, 1);
        assert_eq!(snapshot.output_path, Some(PathBuf::from("products_1.json")));
    }

    #[test]
    fn test_clones_share_state() {
        let tracker = ExtractionTracker::new();
        let clone = tracker.clone();
        clone.set_status(ExtractionStatus::Paginating);
        assert_eq!(tracker.status(), ExtractionStatus::Paginating);
        assert!(tracker.status().is_active());
    }

    #[test]
    fn test_status_serializes_kebab_case() {
        assert_eq!(
            serde_json::to_value(ExtractionStatus::FetchingPrimary).unwrap(),
            json!("fetching-primary")
        );
        assert_eq!(ExtractionStatus::FetchingSecondary.to_string(), "fetching-secondary");
    }

    #[test]
    fn test_log_entry_display_has_timestamp_prefix() {
        let tracker = ExtractionTracker::new();
        tracker.info("Fetched page 1");
        let line = tracker.snapshot().log[0].to_string();
        assert!(line.starts_with('['));
        assert!(line.ends_with("] Fetched page 1"));
    }

    #[test]
    fn test_progress_range_maps_halves() {
        let lower = ProgressRange::new(0, 50);
        assert_eq!(lower.map(0), 0);
        assert_eq!(lower.map(45), 22);
        assert_eq!(lower.map(100), 50);

        let upper = ProgressRange::new(50, 100);
        assert_eq!(upper.map(33), 66);
        assert_eq!(upper.map(100), 100);
        assert_eq!(ProgressRange::new(80, 20), ProgressRange::new(80, 80));
    }
}
