//! Write operations produced by reconciliation.

use crate::record::{FileKey, ManifestFileRecord};
use crate::status::FileStatus;
use manifest_sync_store::WriteRequest;

/// Kind of store write an operation performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
    /// Whole-item put.
    Put,
    /// Delete by key.
    Delete,
}

/// The minimal write needed to reconcile one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    /// Write the record, replacing whatever is stored.
    Put(ManifestFileRecord),
    /// Delete the record.
    Delete(FileKey),
    /// Leave the store untouched.
    NoOp,
}

impl WriteOp {
    /// Returns the write kind, or `None` for [`WriteOp::NoOp`].
    pub fn kind(&self) -> Option<WriteKind> {
        match self {
            WriteOp::Put(_) => Some(WriteKind::Put),
            WriteOp::Delete(_) => Some(WriteKind::Delete),
            WriteOp::NoOp => None,
        }
    }

    /// Returns the record a put writes.
    pub fn record(&self) -> Option<&ManifestFileRecord> {
        match self {
            WriteOp::Put(record) => Some(record),
            _ => None,
        }
    }

    /// Converts the operation into a batch write request.
    pub fn to_request(&self) -> Option<WriteRequest> {
        match self {
            WriteOp::Put(record) => Some(WriteRequest::put(record.to_item())),
            WriteOp::Delete(key) => Some(WriteRequest::delete(key.to_item())),
            WriteOp::NoOp => None,
        }
    }

    /// Returns true if this operation writes nothing.
    pub fn is_noop(&self) -> bool {
        matches!(self, WriteOp::NoOp)
    }
}

/// Outcome of reconciling one file: the write to perform and the status
/// the file will have once that write lands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    /// Write to perform.
    pub op: WriteOp,
    /// Resulting status reported back to the client.
    pub status: FileStatus,
}

impl Decision {
    /// A put whose resulting status is the record's status.
    pub fn put(record: ManifestFileRecord) -> Self {
        let status = record.status;
        Self {
            op: WriteOp::Put(record),
            status,
        }
    }

    /// A delete; the file is reported as removed.
    pub fn delete(key: FileKey) -> Self {
        Self {
            op: WriteOp::Delete(key),
            status: FileStatus::Removed,
        }
    }

    /// No write; the file keeps `status`.
    pub fn keep(status: FileStatus) -> Self {
        Self {
            op: WriteOp::NoOp,
            status,
        }
    }
}
