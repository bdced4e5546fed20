//! Configuration for the sync engine.

use crate::error::{SyncError, SyncResult};
use manifest_sync_protocol::attrs;
use manifest_sync_store::MAX_BATCH_WRITE;
use std::time::Duration;

/// Default number of concurrent workers per sync call.
///
/// The store, not the CPU, bounds throughput; more workers showed no gain
/// on manifests of up to about a thousand files.
pub const DEFAULT_WORKERS: usize = 2;

/// Configuration for sync operations.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Table holding manifest file records.
    pub table_name: String,
    /// Sparse index over files that still carry the in-progress marker.
    pub in_progress_index: String,
    /// Concurrent workers per sync call.
    pub workers: usize,
    /// Files per batch write.
    pub batch_size: usize,
    /// Capacity of the fan-out queue.
    pub queue_capacity: usize,
    /// Retry configuration for unprocessed batch items.
    pub retry: RetryConfig,
}

impl SyncConfig {
    /// Creates a new sync configuration.
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            in_progress_index: attrs::IN_PROGRESS_INDEX.to_string(),
            workers: DEFAULT_WORKERS,
            batch_size: MAX_BATCH_WRITE,
            queue_capacity: MAX_BATCH_WRITE * DEFAULT_WORKERS,
            retry: RetryConfig::default(),
        }
    }

    /// Sets the worker count.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Sets the batch size.
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    /// Sets the fan-out queue capacity.
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Sets the in-progress index name.
    pub fn with_in_progress_index(mut self, index: impl Into<String>) -> Self {
        self.in_progress_index = index.into();
        self
    }

    /// Sets the retry configuration.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Checks the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidConfig`] for an empty table name, zero
    /// workers, a zero queue capacity, or a batch size outside
    /// `1..=MAX_BATCH_WRITE`.
    pub fn validate(&self) -> SyncResult<()> {
        if self.table_name.is_empty() {
            return Err(SyncError::InvalidConfig("table name is empty".into()));
        }
        if self.workers == 0 {
            return Err(SyncError::InvalidConfig("worker count must be positive".into()));
        }
        if self.queue_capacity == 0 {
            return Err(SyncError::InvalidConfig(
                "queue capacity must be positive".into(),
            ));
        }
        if self.batch_size == 0 || self.batch_size > MAX_BATCH_WRITE {
            return Err(SyncError::InvalidConfig(format!(
                "batch size {} outside 1..={MAX_BATCH_WRITE}",
                self.batch_size
            )));
        }
        Ok(())
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new("ManifestFiles")
    }
}

/// Configuration for resubmitting unprocessed batch items.
///
/// The first submission of a batch is not a retry. Each retry `n`
/// (1-based) waits `base_delay * n`, capped at `max_delay`.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of resubmissions after the first attempt.
    pub max_retries: u32,
    /// Delay unit; retry `n` waits `n` units.
    pub base_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
}

impl RetryConfig {
    /// Creates a retry configuration with the default delays.
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
        }
    }

    /// Creates a configuration with no retries.
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Creates a configuration that retries without waiting.
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Sets the base delay.
    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Sets the maximum delay.
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Calculates the delay before retry `retry` (1-based; 0 means the
    /// first submission and never waits).
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        self.base_delay.saturating_mul(retry).min(self.max_delay)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::new(5)
    }
}
