//! The manifest sync facade.

use crate::cancel::CancelToken;
use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::lookup::StatusLookup;
use crate::pool::SyncWorkerPool;
use crate::registry::ManifestRegistry;
use crate::stats::EngineStats;
use manifest_sync_protocol::{
    attrs, DesiredFileState, FileKey, FileStatus, ManifestFileRecord, SyncSummary,
};
use manifest_sync_store::{AttributeValue, ItemUpdate, KvStore, Query};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, info_span, warn};

/// Synchronizes client-declared file states for manifests into a store.
///
/// The engine is shared by reference; every [`sync`](Self::sync) call owns
/// its workers, queue and completion signal, so calls for different
/// manifests may run concurrently.
pub struct ManifestSyncEngine<S: KvStore + ?Sized, R: ManifestRegistry> {
    config: SyncConfig,
    store: Arc<S>,
    registry: R,
    stats: RwLock<EngineStats>,
}

impl<S: KvStore + ?Sized, R: ManifestRegistry> ManifestSyncEngine<S, R> {
    /// Creates an engine.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidConfig`] if `config` is unusable.
    pub fn new(config: SyncConfig, store: Arc<S>, registry: R) -> SyncResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            store,
            registry,
            stats: RwLock::new(EngineStats::default()),
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Returns the manifest registry.
    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// Returns counters accumulated over every call.
    pub fn stats(&self) -> EngineStats {
        *self.stats.read()
    }

    /// Reconciles `desired` with the persisted records of `manifest_id`.
    ///
    /// Every file appears in the returned summary exactly once, either
    /// with its resulting status or with the reason it failed. Per-file
    /// problems (lookup errors, unhandled transitions, writes left
    /// unprocessed after retries) never abort the call.
    ///
    /// With `forced_status`, every file is written with that status
    /// without consulting the persisted one.
    ///
    /// # Errors
    ///
    /// - [`SyncError::ManifestNotFound`] if the manifest does not exist;
    ///   nothing is written.
    /// - [`SyncError::Cancelled`] if `cancel` fired before work began.
    /// - [`SyncError::Store`] if the manifest check itself failed.
    pub fn sync(
        &self,
        manifest_id: &str,
        desired: Vec<DesiredFileState>,
        forced_status: Option<FileStatus>,
        cancel: &CancelToken,
    ) -> SyncResult<SyncSummary> {
        let span = info_span!("manifest_sync", manifest_id, files = desired.len());
        let _guard = span.enter();

        let exists = self.registry.manifest_exists(manifest_id).map_err(|e| {
            self.stats.write().syncs_rejected += 1;
            SyncError::from(e)
        })?;
        if !exists {
            warn!("manifest not found");
            self.stats.write().syncs_rejected += 1;
            return Err(SyncError::ManifestNotFound {
                manifest_id: manifest_id.to_string(),
            });
        }

        if cancel.is_cancelled() {
            self.stats.write().syncs_rejected += 1;
            return Err(SyncError::Cancelled);
        }

        let started = Instant::now();
        let stats = SyncWorkerPool::new(&*self.store, &self.config).run(
            manifest_id,
            desired,
            forced_status,
            cancel,
        );
        let batches = stats.batches();
        let retries = stats.retries();
        let summary = stats.finish();

        info!(
            files_updated = summary.files_updated,
            files_removed = summary.files_removed,
            failed = summary.failures.len(),
            batches,
            retries,
            forced = ?forced_status,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "manifest sync finished"
        );
        self.stats.write().record(&summary, retries);

        Ok(summary)
    }

    /// Returns the persisted status of one file, `Unknown` if absent.
    pub fn file_status(&self, manifest_id: &str, file_id: &str) -> SyncResult<FileStatus> {
        StatusLookup::new(&*self.store, &self.config.table_name).lookup(manifest_id, file_id)
    }

    /// Returns the persisted record of one file, if any.
    pub fn file_record(
        &self,
        manifest_id: &str,
        file_id: &str,
    ) -> SyncResult<Option<ManifestFileRecord>> {
        let item =
            StatusLookup::new(&*self.store, &self.config.table_name).record(manifest_id, file_id)?;
        Ok(item
            .map(|item| ManifestFileRecord::from_item(&item))
            .transpose()?)
    }

    /// Returns the files of `manifest_id` still in progress, read from the
    /// sparse in-progress index.
    pub fn in_progress_files(&self, manifest_id: &str) -> SyncResult<Vec<ManifestFileRecord>> {
        let query = Query::partition(AttributeValue::s(manifest_id))
            .on_index(self.config.in_progress_index.clone());
        self.query_records(&query)
    }

    /// Returns every persisted record of `manifest_id`.
    pub fn list_files(&self, manifest_id: &str) -> SyncResult<Vec<ManifestFileRecord>> {
        self.query_records(&Query::partition(AttributeValue::s(manifest_id)))
    }

    /// Moves an existing record to `status`, as an importer does when it
    /// progresses a file.
    ///
    /// The in-progress marker is set or removed to match `status`.
    ///
    /// # Errors
    ///
    /// Returns a [`SyncError::Store`] condition failure if the record does
    /// not exist.
    pub fn mark_status(
        &self,
        manifest_id: &str,
        file_id: &str,
        status: FileStatus,
    ) -> SyncResult<ManifestFileRecord> {
        let key = FileKey::new(manifest_id, file_id).to_item();
        let update = ItemUpdate::new()
            .set(attrs::STATUS, AttributeValue::s(status.as_str()))
            .must_exist();
        let update = if status.is_in_progress() {
            update.set(
                attrs::IN_PROGRESS,
                AttributeValue::s(attrs::IN_PROGRESS_SENTINEL),
            )
        } else {
            update.remove(attrs::IN_PROGRESS)
        };

        let item = self
            .store
            .update_item(&self.config.table_name, &key, &update)?;
        debug!(manifest_id, file_id, %status, "status marked");
        Ok(ManifestFileRecord::from_item(&item)?)
    }

    fn query_records(&self, query: &Query) -> SyncResult<Vec<ManifestFileRecord>> {
        self.store
            .query(&self.config.table_name, query)?
            .iter()
            .map(|item| ManifestFileRecord::from_item(item).map_err(SyncError::from))
            .collect()
    }
}
