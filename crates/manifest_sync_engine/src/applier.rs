//! Batch writes with resubmission of unprocessed items.

use crate::cancel::CancelToken;
use crate::config::RetryConfig;
use manifest_sync_protocol::{FailureReason, FileFailure, FileKey};
use manifest_sync_store::{KvStore, WriteRequest, MAX_BATCH_WRITE};
use tracing::{debug, error, warn};

/// Result of applying one batch.
///
/// `applied + failures.len()` always equals the number of submitted
/// requests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyOutcome {
    /// Requests the store applied, across the first attempt and retries.
    pub applied: usize,
    /// Requests that never applied, attributed to their file.
    pub failures: Vec<FileFailure>,
    /// Resubmissions made.
    pub retries: u32,
}

impl ApplyOutcome {
    fn merge(&mut self, other: ApplyOutcome) {
        self.applied += other.applied;
        self.failures.extend(other.failures);
        self.retries += other.retries;
    }
}

/// Submits write requests as batch writes and resubmits whatever the store
/// leaves unprocessed.
///
/// Exhausting the retries is not an error: the leftover requests are
/// reported as [`FailureReason::Unprocessed`] so the caller can name the
/// files that did not sync. Transient store errors (throttling,
/// unavailability) count as a fully unprocessed attempt; any other store
/// error fails every pending request of the batch with
/// [`FailureReason::Write`].
pub struct BatchApplier<'a, S: KvStore + ?Sized> {
    store: &'a S,
    table: &'a str,
    retry: &'a RetryConfig,
    cancel: &'a CancelToken,
}

impl<'a, S: KvStore + ?Sized> BatchApplier<'a, S> {
    /// Creates an applier against `table`.
    pub fn new(
        store: &'a S,
        table: &'a str,
        retry: &'a RetryConfig,
        cancel: &'a CancelToken,
    ) -> Self {
        Self {
            store,
            table,
            retry,
            cancel,
        }
    }

    /// Applies `requests`, splitting them into store-sized batches.
    pub fn apply(&self, requests: Vec<WriteRequest>) -> ApplyOutcome {
        let mut outcome = ApplyOutcome::default();
        let mut requests = requests;
        while !requests.is_empty() {
            let rest = requests.split_off(requests.len().min(MAX_BATCH_WRITE));
            outcome.merge(self.apply_batch(requests));
            requests = rest;
        }
        outcome
    }

    fn apply_batch(&self, requests: Vec<WriteRequest>) -> ApplyOutcome {
        let mut outcome = ApplyOutcome::default();
        let mut pending = requests;
        let mut cancelled = false;

        loop {
            match self.store.batch_write(self.table, pending.clone()) {
                Ok(output) => {
                    outcome.applied += pending.len().saturating_sub(output.unprocessed.len());
                    pending = output.unprocessed;
                }
                Err(e) if e.is_retryable() => {
                    warn!(table = self.table, error = %e, pending = pending.len(), "batch write rejected, will retry");
                }
                Err(e) => {
                    error!(table = self.table, error = %e, pending = pending.len(), "batch write failed");
                    let reason = FailureReason::Write(e.to_string());
                    outcome.failures.extend(attribute(&pending, &reason));
                    return outcome;
                }
            }

            if pending.is_empty() || outcome.retries >= self.retry.max_retries {
                break;
            }

            outcome.retries += 1;
            let delay = self.retry.delay_for_retry(outcome.retries);
            debug!(
                table = self.table,
                unprocessed = pending.len(),
                retry = outcome.retries,
                ?delay,
                "resubmitting unprocessed writes"
            );
            if self.cancel.sleep(delay) {
                cancelled = true;
                break;
            }
        }

        if !pending.is_empty() {
            let reason = if cancelled {
                FailureReason::Cancelled
            } else {
                FailureReason::Unprocessed
            };
            warn!(
                table = self.table,
                unprocessed = pending.len(),
                retries = outcome.retries,
                cancelled,
                "writes left unprocessed"
            );
            outcome.failures.extend(attribute(&pending, &reason));
        }

        outcome
    }
}

/// Recovers the file each request addresses by unmarshalling its key.
fn attribute(requests: &[WriteRequest], reason: &FailureReason) -> Vec<FileFailure> {
    requests
        .iter()
        .map(|request| match FileKey::from_request(request) {
            Ok(key) => FileFailure::new(key.file_id, reason.clone()),
            Err(e) => {
                error!(error = %e, "cannot recover file id of a failed write");
                FileFailure::new(String::new(), FailureReason::Marshal(e.to_string()))
            }
        })
        .collect()
}
