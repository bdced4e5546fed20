//! # Manifest Sync Protocol
//!
//! Types shared between the sync engine and its callers.
//!
//! This crate provides:
//! - [`FileStatus`], the ordered lifecycle vocabulary of an uploaded file
//! - [`ManifestFileRecord`] and [`FileKey`] with item marshalling
//! - [`DesiredFileState`], the per-file input of a sync call
//! - [`WriteOp`] and [`Decision`], the output of reconciliation
//! - [`SyncSummary`] and [`FileFailure`], the output of a sync call
//!
//! This is a pure crate with no I/O operations.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod attrs;
mod desired;
mod error;
mod op;
mod record;
mod status;
mod summary;

pub use desired::DesiredFileState;
pub use error::{MarshalError, MarshalResult};
pub use op::{Decision, WriteKind, WriteOp};
pub use record::{FileKey, ManifestFileRecord};
pub use status::{FileStatus, StatusSource, UnknownStatus};
pub use summary::{FailureReason, FileFailure, FileOutcome, SyncSummary};
