//! Error types for store operations.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during store operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The named table does not exist.
    #[error("table not found: {0}")]
    TableNotFound(String),

    /// The named secondary index does not exist on the table.
    #[error("index {index} not found on table {table}")]
    IndexNotFound {
        /// The table that was queried.
        table: String,
        /// The requested index.
        index: String,
    },

    /// The requested item does not exist.
    ///
    /// Some stores answer point reads for absent items with an explicit
    /// not-found response instead of an empty result.
    #[error("item not found")]
    ItemNotFound,

    /// A key or item is missing a required key attribute.
    #[error("missing key attribute: {0}")]
    MissingKey(String),

    /// A conditional update found its condition unmet.
    #[error("condition check failed: {0}")]
    ConditionFailed(String),

    /// The request was rejected because throughput was exceeded.
    #[error("request throttled")]
    Throttled,

    /// The store is temporarily unavailable.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The request was malformed.
    #[error("validation error: {0}")]
    Validation(String),
}

impl StoreError {
    /// Returns true if resubmitting the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Throttled | StoreError::Unavailable(_))
    }

    /// Returns true if this error means the item is absent.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::ItemNotFound)
    }
}
