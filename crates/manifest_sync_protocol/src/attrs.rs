//! Attribute names of a manifest file item.

/// Partition key: the manifest the file belongs to.
pub const MANIFEST_ID: &str = "ManifestId";
/// Sort key: the upload identifier of the file.
pub const UPLOAD_ID: &str = "UploadId";
/// Target directory of the file.
pub const FILE_PATH: &str = "FilePath";
/// Target file name.
pub const FILE_NAME: &str = "FileName";
/// Logical package two uploads collapse into.
pub const MERGE_TARGET_ID: &str = "MergeTargetId";
/// Lifecycle status name.
pub const STATUS: &str = "Status";
/// Opaque file classification.
pub const FILE_TYPE: &str = "FileType";
/// Presence-only marker for files that are not finalized yet.
pub const IN_PROGRESS: &str = "InProgress";

/// Value stored in [`IN_PROGRESS`] while the marker is set.
pub const IN_PROGRESS_SENTINEL: &str = "x";

/// Name of the sparse index over [`MANIFEST_ID`] and [`IN_PROGRESS`].
pub const IN_PROGRESS_INDEX: &str = "InProgressIndex";
