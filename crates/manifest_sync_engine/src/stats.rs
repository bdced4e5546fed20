//! Aggregation of per-batch results.

use manifest_sync_protocol::SyncSummary;

/// Result of one batch processed by one worker.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// Index of the worker that processed the batch.
    pub worker: usize,
    /// Partial summary covering exactly the batch's files.
    pub summary: SyncSummary,
    /// Resubmissions the batch write needed.
    pub retries: u32,
}

impl BatchReport {
    /// Creates an empty report for `worker`.
    pub fn new(worker: usize) -> Self {
        Self {
            worker,
            ..Self::default()
        }
    }
}

/// Merges batch reports into one summary.
///
/// Counts are summed and per-file lists concatenated in arrival order;
/// that order carries no meaning.
#[derive(Debug, Default)]
pub struct StatsAggregator {
    summary: SyncSummary,
    batches: usize,
    retries: u64,
    batches_per_worker: Vec<usize>,
}

impl StatsAggregator {
    /// Creates an empty aggregator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one batch report in.
    pub fn absorb(&mut self, report: BatchReport) {
        self.batches += 1;
        self.retries += u64::from(report.retries);
        if self.batches_per_worker.len() <= report.worker {
            self.batches_per_worker.resize(report.worker + 1, 0);
        }
        self.batches_per_worker[report.worker] += 1;
        self.summary.merge(report.summary);
    }

    /// Number of batches absorbed.
    pub fn batches(&self) -> usize {
        self.batches
    }

    /// Total resubmissions across all batches.
    pub fn retries(&self) -> u64 {
        self.retries
    }

    /// Batches absorbed per worker index.
    pub fn batches_per_worker(&self) -> &[usize] {
        &self.batches_per_worker
    }

    /// Files accounted for so far.
    pub fn processed(&self) -> usize {
        self.summary.processed_count()
    }

    /// Returns the merged summary.
    pub fn finish(self) -> SyncSummary {
        self.summary
    }
}

/// Cumulative counters across every sync call an engine has run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    /// Sync calls that ran to completion.
    pub syncs_completed: u64,
    /// Sync calls rejected before any work (missing manifest, cancelled).
    pub syncs_rejected: u64,
    /// Records written with a put.
    pub files_updated: u64,
    /// Records deleted.
    pub files_removed: u64,
    /// Files that ended with a failure.
    pub files_failed: u64,
    /// Batch resubmissions.
    pub retries: u64,
}

impl EngineStats {
    pub(crate) fn record(&mut self, summary: &SyncSummary, retries: u64) {
        self.syncs_completed += 1;
        self.files_updated += summary.files_updated as u64;
        self.files_removed += summary.files_removed as u64;
        self.files_failed += summary.failures.len() as u64;
        self.retries += retries;
    }
}
