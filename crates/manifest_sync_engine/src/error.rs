//! Error types for the sync engine.

use manifest_sync_protocol::{FileStatus, MarshalError};
use manifest_sync_store::StoreError;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur during sync operations.
///
/// Only manifest-level failures abort a sync call. Per-file errors are
/// recorded in the call's summary instead.
#[derive(Error, Debug)]
pub enum SyncError {
    /// The manifest does not exist; nothing was written.
    #[error("manifest not found: {manifest_id}")]
    ManifestNotFound {
        /// Requested manifest.
        manifest_id: String,
    },

    /// The store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The desired/current status combination has no reconciliation rule.
    #[error(
        "unhandled transition for {manifest_id}/{file_id}: desired {desired}, current {current}"
    )]
    UnhandledTransition {
        /// Manifest ID.
        manifest_id: String,
        /// File ID.
        file_id: String,
        /// Client-declared status.
        desired: FileStatus,
        /// Persisted status.
        current: FileStatus,
    },

    /// Record data was malformed.
    #[error("marshal error: {0}")]
    Marshal(#[from] MarshalError),

    /// The call was cancelled before any work was queued.
    #[error("sync cancelled")]
    Cancelled,

    /// The engine configuration is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl SyncError {
    /// Returns true if this error can be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Store(e) => e.is_retryable(),
            _ => false,
        }
    }
}
