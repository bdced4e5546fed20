//! Results of a sync call.

use crate::status::FileStatus;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Resulting status of one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileOutcome {
    /// Upload identifier.
    pub file_id: String,
    /// Status after reconciliation.
    pub status: FileStatus,
}

/// Why a file did not sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail")]
pub enum FailureReason {
    /// The current status could not be read.
    Lookup(String),
    /// The desired/current combination has no reconciliation rule.
    UnhandledTransition {
        /// Client-declared status.
        desired: FileStatus,
        /// Persisted status.
        current: FileStatus,
    },
    /// The file's data could not be converted to or from a record.
    Marshal(String),
    /// The store rejected the batch the file was part of.
    Write(String),
    /// The store left the write unprocessed after every retry.
    Unprocessed,
    /// The call was cancelled before the file was written.
    Cancelled,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Lookup(msg) => write!(f, "status lookup failed: {msg}"),
            FailureReason::UnhandledTransition { desired, current } => {
                write!(f, "no rule for desired {desired} over current {current}")
            }
            FailureReason::Marshal(msg) => write!(f, "malformed record: {msg}"),
            FailureReason::Write(msg) => write!(f, "batch write rejected: {msg}"),
            FailureReason::Unprocessed => f.write_str("left unprocessed after retries"),
            FailureReason::Cancelled => f.write_str("cancelled"),
        }
    }
}

/// A file that did not sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFailure {
    /// Upload identifier.
    pub file_id: String,
    /// Reason.
    pub reason: FailureReason,
}

impl FileFailure {
    /// Creates a failure.
    pub fn new(file_id: impl Into<String>, reason: FailureReason) -> Self {
        Self {
            file_id: file_id.into(),
            reason,
        }
    }
}

/// Aggregate result of a sync call.
///
/// Every file submitted to the call appears exactly once, either in
/// `statuses` or in `failures`. Order across files is unspecified.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSummary {
    /// Records written by a put.
    pub files_updated: usize,
    /// Records deleted.
    pub files_removed: usize,
    /// Resulting status per file.
    pub statuses: Vec<FileOutcome>,
    /// Files that did not sync; clients should resubmit these.
    pub failures: Vec<FileFailure>,
}

impl SyncSummary {
    /// Creates an empty summary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a file's resulting status.
    pub fn record_status(&mut self, file_id: impl Into<String>, status: FileStatus) {
        self.statuses.push(FileOutcome {
            file_id: file_id.into(),
            status,
        });
    }

    /// Records a failed file.
    pub fn record_failure(&mut self, file_id: impl Into<String>, reason: FailureReason) {
        self.failures.push(FileFailure::new(file_id, reason));
    }

    /// Folds another partial summary into this one.
    pub fn merge(&mut self, other: SyncSummary) {
        self.files_updated += other.files_updated;
        self.files_removed += other.files_removed;
        self.statuses.extend(other.statuses);
        self.failures.extend(other.failures);
    }

    /// Identifiers of files that did not sync.
    pub fn failed_file_ids(&self) -> Vec<&str> {
        self.failures.iter().map(|f| f.file_id.as_str()).collect()
    }

    /// Resulting status of a file, if it synced.
    pub fn status_of(&self, file_id: &str) -> Option<FileStatus> {
        self.statuses
            .iter()
            .find(|outcome| outcome.file_id == file_id)
            .map(|outcome| outcome.status)
    }

    /// Failure reason of a file, if it failed.
    pub fn failure_of(&self, file_id: &str) -> Option<&FailureReason> {
        self.failures
            .iter()
            .find(|failure| failure.file_id == file_id)
            .map(|failure| &failure.reason)
    }

    /// Number of files accounted for.
    pub fn processed_count(&self) -> usize {
        self.statuses.len() + self.failures.len()
    }

    /// Returns true if every file synced.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}
