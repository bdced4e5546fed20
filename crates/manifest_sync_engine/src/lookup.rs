//! Reading the persisted status of a file.

use crate::error::SyncResult;
use manifest_sync_protocol::{FileKey, FileStatus, ManifestFileRecord};
use manifest_sync_store::{Item, KvStore};

/// Fetches the persisted status of single files.
///
/// A missing record and an explicit not-found response both read as
/// [`FileStatus::Unknown`]; a record that never existed and one that was
/// deleted are indistinguishable. Every call goes to the store, so a
/// decision always sees the status as of its own read.
pub struct StatusLookup<'a, S: KvStore + ?Sized> {
    store: &'a S,
    table: &'a str,
}

impl<'a, S: KvStore + ?Sized> StatusLookup<'a, S> {
    /// Creates a lookup against `table`.
    pub fn new(store: &'a S, table: &'a str) -> Self {
        Self { store, table }
    }

    /// Returns the persisted status of one file.
    ///
    /// # Errors
    ///
    /// Returns the store's error for anything other than not-found.
    pub fn lookup(&self, manifest_id: &str, file_id: &str) -> SyncResult<FileStatus> {
        let item = self.record(manifest_id, file_id)?;
        Ok(item.map_or(FileStatus::Unknown, |item| {
            ManifestFileRecord::status_of(&item)
        }))
    }

    /// Returns the raw persisted item of one file, if any.
    pub fn record(&self, manifest_id: &str, file_id: &str) -> SyncResult<Option<Item>> {
        let key = FileKey::new(manifest_id, file_id).to_item();
        match self.store.get_item(self.table, &key) {
            Ok(item) => Ok(item),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
