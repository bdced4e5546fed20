//! Decision-table vectors.
//!
//! Each vector names a desired and a persisted status and the write the
//! engine must choose. Vectors are kept as JSON so that other
//! implementations of the same table can share them.

use manifest_sync_engine::decide;
use manifest_sync_protocol::{DesiredFileState, FileStatus, WriteOp};
use serde::{Deserialize, Serialize};

/// The write a vector expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpectedWrite {
    /// A put of the whole record.
    Put,
    /// A delete of the record.
    Delete,
    /// No write.
    None,
    /// The combination is rejected.
    Unhandled,
}

/// A decision-table test vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionVector {
    /// Unique identifier for this vector.
    pub id: String,
    /// Client-declared status.
    pub desired: FileStatus,
    /// Persisted status.
    pub current: FileStatus,
    /// Expected write.
    pub write: ExpectedWrite,
    /// Expected reported status; absent for unhandled combinations.
    #[serde(default)]
    pub status: Option<FileStatus>,
    /// Expected in-progress marker on a put.
    #[serde(default)]
    pub in_progress: Option<bool>,
}

const DECISION_VECTORS: &str = r#"[
  {"id": "scenario_a_new_file", "desired": "Local", "current": "Unknown", "write": "put", "status": "Registered", "in_progress": true},
  {"id": "scenario_b_remove_registered", "desired": "Removed", "current": "Registered", "write": "delete", "status": "Removed"},
  {"id": "scenario_c_promote_finalized", "desired": "Registered", "current": "Finalized", "write": "put", "status": "Verified", "in_progress": false},
  {"id": "scenario_d_keep_imported", "desired": "Imported", "current": "Imported", "write": "none", "status": "Imported"},
  {"id": "remove_finalized_promotes", "desired": "Removed", "current": "Finalized", "write": "put", "status": "Verified", "in_progress": false},
  {"id": "remove_imported_keeps", "desired": "Removed", "current": "Imported", "write": "none", "status": "Imported"},
  {"id": "remove_verified_keeps", "desired": "Removed", "current": "Verified", "write": "none", "status": "Verified"},
  {"id": "remove_failed_deletes", "desired": "Removed", "current": "Failed", "write": "delete", "status": "Removed"},
  {"id": "remove_unknown_deletes", "desired": "Removed", "current": "Unknown", "write": "delete", "status": "Removed"},
  {"id": "local_over_registered", "desired": "Local", "current": "Registered", "write": "put", "status": "Registered", "in_progress": true},
  {"id": "local_over_failed", "desired": "Local", "current": "Failed", "write": "put", "status": "Registered", "in_progress": true},
  {"id": "local_over_finalized", "desired": "Local", "current": "Finalized", "write": "put", "status": "Verified", "in_progress": false},
  {"id": "local_over_imported", "desired": "Local", "current": "Imported", "write": "none", "status": "Imported"},
  {"id": "local_over_verified", "desired": "Local", "current": "Verified", "write": "none", "status": "Verified"},
  {"id": "failed_retry_reregisters", "desired": "Failed", "current": "Failed", "write": "put", "status": "Registered", "in_progress": true},
  {"id": "failed_over_unknown", "desired": "Failed", "current": "Unknown", "write": "put", "status": "Registered", "in_progress": true},
  {"id": "imported_over_finalized", "desired": "Imported", "current": "Finalized", "write": "put", "status": "Verified", "in_progress": false},
  {"id": "imported_over_registered", "desired": "Imported", "current": "Registered", "write": "none", "status": "Registered"},
  {"id": "registered_refresh", "desired": "Registered", "current": "Registered", "write": "put", "status": "Registered", "in_progress": true},
  {"id": "changed_over_imported", "desired": "Changed", "current": "Imported", "write": "put", "status": "Verified", "in_progress": false},
  {"id": "changed_over_unknown", "desired": "Changed", "current": "Unknown", "write": "none", "status": "Unknown"},
  {"id": "unknown_over_verified", "desired": "Unknown", "current": "Verified", "write": "put", "status": "Verified", "in_progress": false},
  {"id": "unknown_over_failed", "desired": "Unknown", "current": "Failed", "write": "none", "status": "Failed"},
  {"id": "finalized_is_server_only", "desired": "Finalized", "current": "Registered", "write": "none", "status": "Registered"},
  {"id": "verified_is_server_only", "desired": "Verified", "current": "Unknown", "write": "none", "status": "Unknown"},
  {"id": "uploaded_unhandled", "desired": "Uploaded", "current": "Registered", "write": "unhandled"},
  {"id": "uploaded_over_unknown_unhandled", "desired": "Uploaded", "current": "Unknown", "write": "unhandled"}
]"#;

/// Decision-table vectors.
pub fn decision_vectors() -> Vec<DecisionVector> {
    serde_json::from_str(DECISION_VECTORS).expect("decision vectors are valid JSON")
}

/// Runs `vector` through [`decide`] and describes the first mismatch.
pub fn check_vector(vector: &DecisionVector) -> Result<(), String> {
    let desired = DesiredFileState::new("u-vector", "dir", "file", vector.desired);
    let decision = match decide("m-vector", &desired, vector.current) {
        Ok(decision) => decision,
        Err(_) if vector.write == ExpectedWrite::Unhandled => return Ok(()),
        Err(e) => return Err(format!("{}: unexpected error {e}", vector.id)),
    };

    let (write, in_progress) = match &decision.op {
        WriteOp::Put(record) => (ExpectedWrite::Put, Some(record.in_progress)),
        WriteOp::Delete(_) => (ExpectedWrite::Delete, None),
        WriteOp::NoOp => (ExpectedWrite::None, None),
    };
    if write != vector.write {
        return Err(format!("{}: expected {:?}, got {:?}", vector.id, vector.write, write));
    }
    if vector.status != Some(decision.status) {
        return Err(format!(
            "{}: expected status {:?}, got {}",
            vector.id, vector.status, decision.status
        ));
    }
    if vector.in_progress.is_some() && vector.in_progress != in_progress {
        return Err(format!(
            "{}: expected in_progress {:?}, got {:?}",
            vector.id, vector.in_progress, in_progress
        ));
    }
    Ok(())
}
