//! Client-declared file state.

use crate::attrs;
use crate::error::{MarshalError, MarshalResult};
use crate::record::ManifestFileRecord;
use crate::status::FileStatus;
use serde::{Deserialize, Serialize};

/// What a client asserts about one file in a sync call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredFileState {
    /// Upload identifier.
    pub file_id: String,
    /// Target directory.
    pub file_path: String,
    /// Target file name.
    pub file_name: String,
    /// Status the client declares.
    pub status: FileStatus,
    /// Logical package this upload merges into.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge_target_id: Option<String>,
    /// Opaque file classification.
    #[serde(default)]
    pub file_type: String,
}

impl DesiredFileState {
    /// Creates a desired state with no merge target and an empty file type.
    pub fn new(
        file_id: impl Into<String>,
        file_path: impl Into<String>,
        file_name: impl Into<String>,
        status: FileStatus,
    ) -> Self {
        Self {
            file_id: file_id.into(),
            file_path: file_path.into(),
            file_name: file_name.into(),
            status,
            merge_target_id: None,
            file_type: String::new(),
        }
    }

    /// Sets the merge target.
    pub fn with_merge_target(mut self, target: impl Into<String>) -> Self {
        self.merge_target_id = Some(target.into());
        self
    }

    /// Sets the file type.
    pub fn with_file_type(mut self, file_type: impl Into<String>) -> Self {
        self.file_type = file_type.into();
        self
    }

    /// Checks that the state can be stored as a record.
    pub fn validate(&self) -> MarshalResult<()> {
        if self.file_id.is_empty() {
            return Err(MarshalError::EmptyKey(attrs::UPLOAD_ID));
        }
        Ok(())
    }

    /// Builds the record this state would persist under `manifest_id`.
    pub fn to_record(
        &self,
        manifest_id: &str,
        status: FileStatus,
        in_progress: bool,
    ) -> ManifestFileRecord {
        ManifestFileRecord {
            manifest_id: manifest_id.to_string(),
            file_id: self.file_id.clone(),
            file_path: self.file_path.clone(),
            file_name: self.file_name.clone(),
            merge_target_id: self.merge_target_id.clone(),
            status,
            file_type: self.file_type.clone(),
            in_progress,
        }
    }
}
