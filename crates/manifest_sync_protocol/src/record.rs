//! Persisted manifest file records.

use crate::attrs;
use crate::error::{MarshalError, MarshalResult};
use crate::status::FileStatus;
use manifest_sync_store::{AttributeValue, Item, WriteRequest};
use serde::{Deserialize, Serialize};

/// Key of a manifest file record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FileKey {
    /// Manifest the file belongs to.
    pub manifest_id: String,
    /// Upload identifier of the file.
    pub file_id: String,
}

impl FileKey {
    /// Creates a key.
    pub fn new(manifest_id: impl Into<String>, file_id: impl Into<String>) -> Self {
        Self {
            manifest_id: manifest_id.into(),
            file_id: file_id.into(),
        }
    }

    /// Encodes the key attributes.
    pub fn to_item(&self) -> Item {
        let mut item = Item::new();
        item.insert(
            attrs::MANIFEST_ID.into(),
            AttributeValue::s(&self.manifest_id),
        );
        item.insert(attrs::UPLOAD_ID.into(), AttributeValue::s(&self.file_id));
        item
    }

    /// Decodes the key attributes of a key or a full item.
    pub fn from_item(item: &Item) -> MarshalResult<Self> {
        Ok(Self {
            manifest_id: required_key(item, attrs::MANIFEST_ID)?,
            file_id: required_key(item, attrs::UPLOAD_ID)?,
        })
    }

    /// Recovers the key a write request addresses.
    pub fn from_request(request: &WriteRequest) -> MarshalResult<Self> {
        Self::from_item(request.key_source())
    }
}

/// One uploaded file of a manifest, as persisted in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestFileRecord {
    /// Manifest the file belongs to (partition key).
    pub manifest_id: String,
    /// Upload identifier (sort key).
    pub file_id: String,
    /// Target directory.
    pub file_path: String,
    /// Target file name.
    pub file_name: String,
    /// Logical package this upload merges into, for paired sidecar files.
    pub merge_target_id: Option<String>,
    /// Lifecycle status.
    pub status: FileStatus,
    /// Opaque file classification.
    pub file_type: String,
    /// Whether the in-progress marker attribute is present.
    pub in_progress: bool,
}

impl ManifestFileRecord {
    /// Returns the record's key.
    pub fn key(&self) -> FileKey {
        FileKey::new(&self.manifest_id, &self.file_id)
    }

    /// Encodes the record as a store item.
    ///
    /// When `in_progress` is false the marker attribute is omitted
    /// entirely, so the sparse in-progress index drops the item. Optional
    /// attributes are omitted rather than stored empty for the same reason.
    pub fn to_item(&self) -> Item {
        let mut item = self.key().to_item();
        item.insert(attrs::FILE_PATH.into(), AttributeValue::s(&self.file_path));
        item.insert(attrs::FILE_NAME.into(), AttributeValue::s(&self.file_name));
        item.insert(attrs::STATUS.into(), AttributeValue::s(self.status.as_str()));
        item.insert(attrs::FILE_TYPE.into(), AttributeValue::s(&self.file_type));
        if let Some(target) = &self.merge_target_id {
            item.insert(attrs::MERGE_TARGET_ID.into(), AttributeValue::s(target));
        }
        if self.in_progress {
            item.insert(
                attrs::IN_PROGRESS.into(),
                AttributeValue::s(attrs::IN_PROGRESS_SENTINEL),
            );
        }
        item
    }

    /// Decodes a store item.
    ///
    /// Key attributes are required. Descriptive attributes default to
    /// empty, and an absent or unrecognised status decodes as
    /// [`FileStatus::Unknown`].
    pub fn from_item(item: &Item) -> MarshalResult<Self> {
        let key = FileKey::from_item(item)?;
        let status = optional_string(item, attrs::STATUS)?
            .map(|name| FileStatus::parse_lossy(&name))
            .unwrap_or(FileStatus::Unknown);

        Ok(Self {
            manifest_id: key.manifest_id,
            file_id: key.file_id,
            file_path: optional_string(item, attrs::FILE_PATH)?.unwrap_or_default(),
            file_name: optional_string(item, attrs::FILE_NAME)?.unwrap_or_default(),
            merge_target_id: optional_string(item, attrs::MERGE_TARGET_ID)?
                .filter(|target| !target.is_empty()),
            status,
            file_type: optional_string(item, attrs::FILE_TYPE)?.unwrap_or_default(),
            in_progress: item.contains_key(attrs::IN_PROGRESS),
        })
    }

    /// Reads only the status attribute of an item.
    pub fn status_of(item: &Item) -> FileStatus {
        item.get(attrs::STATUS)
            .and_then(AttributeValue::as_s)
            .map(FileStatus::parse_lossy)
            .unwrap_or(FileStatus::Unknown)
    }
}

fn required_key(item: &Item, name: &'static str) -> MarshalResult<String> {
    let value = optional_string(item, name)?.ok_or(MarshalError::MissingAttribute(name))?;
    if value.is_empty() {
        return Err(MarshalError::EmptyKey(name));
    }
    Ok(value)
}

fn optional_string(item: &Item, name: &'static str) -> MarshalResult<Option<String>> {
    match item.get(name) {
        None => Ok(None),
        Some(AttributeValue::S(s)) => Ok(Some(s.clone())),
        Some(other) => Err(MarshalError::WrongType {
            name,
            expected: "S",
            found: other.type_name(),
        }),
    }
}
