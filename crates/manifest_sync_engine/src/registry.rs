//! Manifest existence checks.

use manifest_sync_protocol::attrs;
use manifest_sync_store::{AttributeValue, Item, KvStore, StoreResult};
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::Arc;

/// Answers whether a manifest exists.
///
/// A sync call consults the registry once, before any file is looked up.
pub trait ManifestRegistry: Send + Sync {
    /// Returns true if `manifest_id` names an existing manifest.
    fn manifest_exists(&self, manifest_id: &str) -> StoreResult<bool>;
}

impl<R: ManifestRegistry + ?Sized> ManifestRegistry for Arc<R> {
    fn manifest_exists(&self, manifest_id: &str) -> StoreResult<bool> {
        (**self).manifest_exists(manifest_id)
    }
}

/// A registry backed by an in-memory set of manifest ids.
#[derive(Debug, Default)]
pub struct StaticManifestRegistry {
    manifests: RwLock<HashSet<String>>,
}

impl StaticManifestRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding `ids`.
    pub fn with_manifests<I, T>(ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            manifests: RwLock::new(ids.into_iter().map(Into::into).collect()),
        }
    }

    /// Adds a manifest.
    pub fn register(&self, manifest_id: impl Into<String>) {
        self.manifests.write().insert(manifest_id.into());
    }

    /// Removes a manifest. Returns true if it was present.
    pub fn unregister(&self, manifest_id: &str) -> bool {
        self.manifests.write().remove(manifest_id)
    }
}

impl ManifestRegistry for StaticManifestRegistry {
    fn manifest_exists(&self, manifest_id: &str) -> StoreResult<bool> {
        Ok(self.manifests.read().contains(manifest_id))
    }
}

/// A registry that looks manifests up in a store table keyed by
/// `ManifestId`.
pub struct StoreManifestRegistry<S: KvStore + ?Sized> {
    store: Arc<S>,
    table: String,
}

impl<S: KvStore + ?Sized> StoreManifestRegistry<S> {
    /// Creates a registry over `table`.
    pub fn new(store: Arc<S>, table: impl Into<String>) -> Self {
        Self {
            store,
            table: table.into(),
        }
    }

    /// Returns the manifests table name.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Writes a manifest row.
    pub fn create_manifest(&self, manifest_id: &str) -> StoreResult<()> {
        self.store.put_item(&self.table, manifest_key(manifest_id))
    }
}

impl<S: KvStore + ?Sized> ManifestRegistry for StoreManifestRegistry<S> {
    fn manifest_exists(&self, manifest_id: &str) -> StoreResult<bool> {
        match self.store.get_item(&self.table, &manifest_key(manifest_id)) {
            Ok(item) => Ok(item.is_some()),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }
}

fn manifest_key(manifest_id: &str) -> Item {
    let mut key = Item::new();
    key.insert(attrs::MANIFEST_ID.to_string(), AttributeValue::s(manifest_id));
    key
}
