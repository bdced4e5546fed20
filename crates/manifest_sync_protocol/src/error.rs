//! Errors raised while converting records to and from store items.

use thiserror::Error;

/// Result type for marshalling.
pub type MarshalResult<T> = Result<T, MarshalError>;

/// Malformed record data.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MarshalError {
    /// A required attribute is absent.
    #[error("missing attribute {0}")]
    MissingAttribute(&'static str),

    /// An attribute holds a value of the wrong type.
    #[error("attribute {name} has type {found}, expected {expected}")]
    WrongType {
        /// Attribute name.
        name: &'static str,
        /// Expected type.
        expected: &'static str,
        /// Type actually found.
        found: &'static str,
    },

    /// A key attribute is present but empty.
    #[error("attribute {0} must not be empty")]
    EmptyKey(&'static str),
}
