//! Concurrent fan-out of file states over a fixed set of workers.

use crate::applier::BatchApplier;
use crate::cancel::CancelToken;
use crate::config::SyncConfig;
use crate::decision::{decide, forced};
use crate::error::SyncError;
use crate::lookup::StatusLookup;
use crate::stats::{BatchReport, StatsAggregator};
use crossbeam_channel::{Receiver, Sender};
use manifest_sync_protocol::{
    Decision, DesiredFileState, FailureReason, FileStatus, WriteKind,
};
use manifest_sync_store::{KvStore, WriteRequest};
use std::collections::{HashMap, HashSet};
use std::thread;
use tracing::{debug, debug_span, error, warn, Span};

/// Runs one sync call's files through `workers` threads.
///
/// A feeder thread pushes every file into one bounded queue; each worker
/// pulls files until the queue closes, grouping them into batches of
/// `batch_size`. Because every file is received from the shared queue
/// exactly once, no two workers ever handle the same file in one call.
/// Workers send a [`BatchReport`] per batch through a results channel with
/// one slot per worker, and [`SyncWorkerPool::run`] returns only after
/// every worker has drained the queue and exited.
///
/// All synchronization state is created per call, so concurrent calls for
/// different manifests never share completion signals.
pub struct SyncWorkerPool<'a, S: KvStore + ?Sized> {
    store: &'a S,
    config: &'a SyncConfig,
}

impl<'a, S: KvStore + ?Sized> SyncWorkerPool<'a, S> {
    /// Creates a pool over `store`.
    pub fn new(store: &'a S, config: &'a SyncConfig) -> Self {
        Self { store, config }
    }

    /// Processes `files` for `manifest_id` and returns the merged results.
    ///
    /// With `forced_status` set, every file is written with that status and
    /// no lookups are made. Files received after `cancel` fires are
    /// reported as [`FailureReason::Cancelled`] without touching the store;
    /// a batch already being applied runs to completion.
    pub fn run(
        &self,
        manifest_id: &str,
        files: Vec<DesiredFileState>,
        forced_status: Option<FileStatus>,
        cancel: &CancelToken,
    ) -> StatsAggregator {
        let files = collapse_duplicates(manifest_id, files);
        let mut stats = StatsAggregator::new();
        if files.is_empty() {
            return stats;
        }

        let workers = self.config.workers.clamp(1, files.len());
        let (queue_tx, queue_rx) = crossbeam_channel::bounded(self.config.queue_capacity);
        let (report_tx, report_rx) = crossbeam_channel::bounded(workers);

        let parent = Span::current();
        thread::scope(|scope| {
            for index in 0..workers {
                let worker = Worker {
                    index,
                    span: debug_span!(parent: &parent, "sync_worker", worker = index),
                    manifest_id,
                    forced_status,
                    store: self.store,
                    config: self.config,
                    cancel,
                };
                let queue = queue_rx.clone();
                let reports = report_tx.clone();
                scope.spawn(move || worker.run(queue, reports));
            }
            drop(queue_rx);
            drop(report_tx);

            scope.spawn(move || {
                for file in files {
                    if queue_tx.send(file).is_err() {
                        break;
                    }
                }
            });

            for report in report_rx.iter() {
                stats.absorb(report);
            }
        });

        stats
    }
}

struct Worker<'a, S: KvStore + ?Sized> {
    index: usize,
    span: Span,
    manifest_id: &'a str,
    forced_status: Option<FileStatus>,
    store: &'a S,
    config: &'a SyncConfig,
    cancel: &'a CancelToken,
}

impl<S: KvStore + ?Sized> Worker<'_, S> {
    fn run(self, queue: Receiver<DesiredFileState>, reports: Sender<BatchReport>) {
        let span = self.span.clone();
        let _guard = span.enter();

        let mut batch = Vec::with_capacity(self.config.batch_size);
        for file in queue.iter() {
            batch.push(file);
            if batch.len() == self.config.batch_size {
                let full = std::mem::replace(&mut batch, Vec::with_capacity(self.config.batch_size));
                if reports.send(self.process(full)).is_err() {
                    return;
                }
            }
        }
        if !batch.is_empty() {
            let _ = reports.send(self.process(batch));
        }
    }

    fn process(&self, batch: Vec<DesiredFileState>) -> BatchReport {
        let mut report = BatchReport::new(self.index);

        if self.cancel.is_cancelled() {
            debug!(files = batch.len(), "cancelled, skipping batch");
            for file in batch {
                report
                    .summary
                    .record_failure(file.file_id, FailureReason::Cancelled);
            }
            return report;
        }

        let lookup = StatusLookup::new(self.store, &self.config.table_name);
        let mut planned: Vec<(String, WriteKind, FileStatus)> = Vec::new();
        let mut requests: Vec<WriteRequest> = Vec::new();

        for file in batch {
            if let Err(e) = file.validate() {
                warn!(manifest_id = self.manifest_id, error = %e, "malformed file state");
                report
                    .summary
                    .record_failure(file.file_id, FailureReason::Marshal(e.to_string()));
                continue;
            }

            let decision = match self.forced_status {
                Some(status) => forced(self.manifest_id, &file, status),
                None => match self.reconcile(&lookup, &file) {
                    Ok(decision) => decision,
                    Err(reason) => {
                        report.summary.record_failure(file.file_id, reason);
                        continue;
                    }
                },
            };

            match (decision.op.kind(), decision.op.to_request()) {
                (Some(kind), Some(request)) => {
                    planned.push((file.file_id, kind, decision.status));
                    requests.push(request);
                }
                _ => report.summary.record_status(file.file_id, decision.status),
            }
        }

        if requests.is_empty() {
            return report;
        }

        let outcome = BatchApplier::new(
            self.store,
            &self.config.table_name,
            &self.config.retry,
            self.cancel,
        )
        .apply(requests);
        report.retries = outcome.retries;

        {
            let failed: HashSet<&str> = outcome
                .failures
                .iter()
                .map(|failure| failure.file_id.as_str())
                .collect();
            for (file_id, kind, status) in planned {
                if failed.contains(file_id.as_str()) {
                    continue;
                }
                match kind {
                    WriteKind::Put => report.summary.files_updated += 1,
                    WriteKind::Delete => report.summary.files_removed += 1,
                }
                report.summary.record_status(file_id, status);
            }
        }
        report.summary.failures.extend(outcome.failures);

        report
    }

    fn reconcile(
        &self,
        lookup: &StatusLookup<'_, S>,
        file: &DesiredFileState,
    ) -> Result<Decision, FailureReason> {
        let current = lookup
            .lookup(self.manifest_id, &file.file_id)
            .map_err(|e| {
                warn!(
                    manifest_id = self.manifest_id,
                    file_id = %file.file_id,
                    error = %e,
                    "status lookup failed"
                );
                FailureReason::Lookup(e.to_string())
            })?;

        match decide(self.manifest_id, file, current) {
            Ok(decision) => {
                debug!(
                    file_id = %file.file_id,
                    desired = %file.status,
                    %current,
                    result = %decision.status,
                    write = ?decision.op.kind(),
                    "reconciled"
                );
                Ok(decision)
            }
            Err(e) => {
                error!(
                    manifest_id = self.manifest_id,
                    file_id = %file.file_id,
                    desired = %file.status,
                    %current,
                    error = %e,
                    "unhandled status transition"
                );
                match e {
                    SyncError::UnhandledTransition { desired, current, .. } => {
                        Err(FailureReason::UnhandledTransition { desired, current })
                    }
                    other => Err(FailureReason::Marshal(other.to_string())),
                }
            }
        }
    }
}

/// Keeps one state per file, the last one submitted, at the position of
/// the first. A batch write may not address the same key twice.
fn collapse_duplicates(manifest_id: &str, files: Vec<DesiredFileState>) -> Vec<DesiredFileState> {
    let mut positions: HashMap<String, usize> = HashMap::with_capacity(files.len());
    let mut unique: Vec<DesiredFileState> = Vec::with_capacity(files.len());

    for file in files {
        match positions.get(&file.file_id) {
            Some(&pos) => {
                warn!(manifest_id, file_id = %file.file_id, "duplicate file in sync request, keeping the last");
                unique[pos] = file;
            }
            None => {
                positions.insert(file.file_id.clone(), unique.len());
                unique.push(file);
            }
        }
    }

    unique
}
