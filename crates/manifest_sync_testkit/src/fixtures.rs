//! Test fixtures and engine helpers.
//!
//! Provides stores laid out like a production deployment and builders for
//! engines and desired file states.

use manifest_sync_engine::{ManifestSyncEngine, RetryConfig, StaticManifestRegistry, SyncConfig};
use manifest_sync_protocol::{attrs, DesiredFileState, FileKey, FileStatus, ManifestFileRecord};
use manifest_sync_store::{IndexSchema, InMemoryStore, KvStore, TableSchema};
use std::sync::Arc;

/// Files table used by fixtures.
pub const FILES_TABLE: &str = "ManifestFiles";
/// Manifests table used by fixtures.
pub const MANIFESTS_TABLE: &str = "Manifests";
/// Manifest registered by default in fixture engines.
pub const MANIFEST_ID: &str = "manifest-1";

/// An engine over an in-memory store and a static registry.
pub type TestEngine = ManifestSyncEngine<InMemoryStore, StaticManifestRegistry>;

/// Schema of the files table: `ManifestId`/`UploadId` key and the sparse
/// in-progress index.
pub fn files_table_schema() -> TableSchema {
    TableSchema::new(attrs::MANIFEST_ID)
        .with_sort_key(attrs::UPLOAD_ID)
        .with_index(IndexSchema::new(
            attrs::IN_PROGRESS_INDEX,
            attrs::MANIFEST_ID,
            attrs::IN_PROGRESS,
        ))
}

/// Creates a store with the files and manifests tables.
pub fn new_store() -> InMemoryStore {
    let store = InMemoryStore::new();
    store.create_table(FILES_TABLE, files_table_schema());
    store.create_table(MANIFESTS_TABLE, TableSchema::new(attrs::MANIFEST_ID));
    store
}

/// Builder for [`TestEngine`].
///
/// Defaults: the fixture tables, [`MANIFEST_ID`] registered, and retries
/// without sleeping.
pub struct TestEngineBuilder {
    config: SyncConfig,
    manifests: Vec<String>,
    store: Option<Arc<InMemoryStore>>,
}

impl TestEngineBuilder {
    /// Creates a builder with the defaults.
    pub fn new() -> Self {
        Self {
            config: SyncConfig::new(FILES_TABLE).with_retry(RetryConfig::immediate(5)),
            manifests: vec![MANIFEST_ID.to_string()],
            store: None,
        }
    }

    /// Replaces the configuration.
    pub fn config(mut self, config: SyncConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the worker count.
    pub fn workers(mut self, workers: usize) -> Self {
        self.config = self.config.with_workers(workers);
        self
    }

    /// Sets the batch size.
    pub fn batch_size(mut self, size: usize) -> Self {
        self.config = self.config.with_batch_size(size);
        self
    }

    /// Sets the retry policy.
    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.config = self.config.with_retry(retry);
        self
    }

    /// Registers another manifest.
    pub fn manifest(mut self, manifest_id: impl Into<String>) -> Self {
        self.manifests.push(manifest_id.into());
        self
    }

    /// Uses an existing store instead of a fresh one.
    pub fn store(mut self, store: Arc<InMemoryStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Builds the engine.
    pub fn build(self) -> TestEngine {
        let store = self.store.unwrap_or_else(|| Arc::new(new_store()));
        ManifestSyncEngine::new(
            self.config,
            store,
            StaticManifestRegistry::with_manifests(self.manifests),
        )
        .expect("fixture config is valid")
    }
}

impl Default for TestEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Desired state for `file_id` with a path and name derived from it.
pub fn desired(file_id: &str, status: FileStatus) -> DesiredFileState {
    DesiredFileState::new(file_id, "uploads", format!("{file_id}.dat"), status)
}

/// `count` desired states named `{prefix}-00`, `{prefix}-01`, ...
pub fn desired_batch(prefix: &str, count: usize, status: FileStatus) -> Vec<DesiredFileState> {
    (0..count)
        .map(|i| desired(&format!("{prefix}-{i:02}"), status))
        .collect()
}

/// Writes a record as if an earlier sync or importer had left it at
/// `status`.
pub fn seed_status(store: &impl KvStore, manifest_id: &str, file_id: &str, status: FileStatus) {
    let record = desired(file_id, FileStatus::Local).to_record(
        manifest_id,
        status,
        status.is_in_progress(),
    );
    store
        .put_item(FILES_TABLE, record.to_item())
        .expect("seeding the files table");
}

/// Reads back the persisted record of a file.
pub fn stored_record(
    store: &impl KvStore,
    manifest_id: &str,
    file_id: &str,
) -> Option<ManifestFileRecord> {
    store
        .get_item(FILES_TABLE, &FileKey::new(manifest_id, file_id).to_item())
        .expect("reading the files table")
        .map(|item| ManifestFileRecord::from_item(&item).expect("fixture records decode"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let engine = TestEngineBuilder::new().manifest("other").build();
        assert_eq!(engine.config().table_name, FILES_TABLE);
        assert!(engine.store().has_table(MANIFESTS_TABLE));
        assert_eq!(engine.config().retry.base_delay, std::time::Duration::ZERO);
    }

    #[test]
    fn seeded_record_round_trips() {
        let store = new_store();
        seed_status(&store, MANIFEST_ID, "u-1", FileStatus::Failed);
        let record = stored_record(&store, MANIFEST_ID, "u-1").unwrap();
        assert_eq!(record.status, FileStatus::Failed);
        assert!(record.in_progress);
        assert_eq!(record.file_name, "u-1.dat");
    }

    #[test]
    fn batch_names() {
        let batch = desired_batch("u", 12, FileStatus::Local);
        assert_eq!(batch[4].file_id, "u-04");
        assert_eq!(batch[11].file_id, "u-11");
    }
}
