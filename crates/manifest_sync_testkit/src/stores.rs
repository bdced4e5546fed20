//! Scripted stores and throttle scripts.
//!
//! Reproduce partial batch writes and failing lookups deterministically.

use manifest_sync_protocol::{attrs, FileKey};
use manifest_sync_store::{
    BatchWriteOutput, InMemoryStore, Item, ItemUpdate, KvStore, Query, StoreError, StoreResult,
    WriteRequest,
};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Leaves the last `count` requests of the first batch-write call
/// unprocessed, then processes everything.
pub fn unprocessed_on_first_call(
    count: usize,
) -> impl Fn(u64, &[WriteRequest]) -> Vec<usize> + Send + Sync + 'static {
    move |call: u64, requests: &[WriteRequest]| {
        if call == 0 {
            (requests.len().saturating_sub(count)..requests.len()).collect()
        } else {
            Vec::new()
        }
    }
}

/// Never processes writes for the given upload ids.
pub fn stuck_files(
    file_ids: &[&str],
) -> impl Fn(u64, &[WriteRequest]) -> Vec<usize> + Send + Sync + 'static {
    let stuck: HashSet<String> = file_ids.iter().map(|id| id.to_string()).collect();
    move |_: u64, requests: &[WriteRequest]| {
        requests
            .iter()
            .enumerate()
            .filter(|(_, request)| {
                request
                    .key_source()
                    .get(attrs::UPLOAD_ID)
                    .and_then(|value| value.as_s())
                    .is_some_and(|id| stuck.contains(id))
            })
            .map(|(pos, _)| pos)
            .collect()
    }
}

/// Wraps a store and fails lookups of chosen files.
///
/// Everything else is delegated to the inner store.
pub struct FlakyLookupStore<S: KvStore + ?Sized = InMemoryStore> {
    inner: Arc<S>,
    failing: Mutex<HashSet<String>>,
    error: StoreError,
}

impl<S: KvStore + ?Sized> FlakyLookupStore<S> {
    /// Wraps `inner`; failing lookups return [`StoreError::Unavailable`].
    pub fn new(inner: Arc<S>) -> Self {
        Self {
            inner,
            failing: Mutex::new(HashSet::new()),
            error: StoreError::Unavailable("injected lookup failure".into()),
        }
    }

    /// Sets the error failing lookups return.
    pub fn with_error(mut self, error: StoreError) -> Self {
        self.error = error;
        self
    }

    /// Makes lookups of `file_id` fail.
    pub fn fail_lookup(&self, file_id: impl Into<String>) {
        self.failing.lock().insert(file_id.into());
    }

    /// Returns the wrapped store.
    pub fn inner(&self) -> &Arc<S> {
        &self.inner
    }

    fn should_fail(&self, key: &Item) -> bool {
        FileKey::from_item(key)
            .map(|key| self.failing.lock().contains(&key.file_id))
            .unwrap_or(false)
    }
}

impl<S: KvStore + ?Sized> KvStore for FlakyLookupStore<S> {
    fn get_item(&self, table: &str, key: &Item) -> StoreResult<Option<Item>> {
        if self.should_fail(key) {
            return Err(self.error.clone());
        }
        self.inner.get_item(table, key)
    }

    fn query(&self, table: &str, query: &Query) -> StoreResult<Vec<Item>> {
        self.inner.query(table, query)
    }

    fn update_item(&self, table: &str, key: &Item, update: &ItemUpdate) -> StoreResult<Item> {
        self.inner.update_item(table, key, update)
    }

    fn put_item(&self, table: &str, item: Item) -> StoreResult<()> {
        self.inner.put_item(table, item)
    }

    fn delete_item(&self, table: &str, key: &Item) -> StoreResult<()> {
        self.inner.delete_item(table, key)
    }

    fn batch_write(&self, table: &str, requests: Vec<WriteRequest>) -> StoreResult<BatchWriteOutput> {
        self.inner.batch_write(table, requests)
    }
}

/// Wraps a store and counts how often each file is looked up and written.
pub struct CountingStore<S: KvStore + ?Sized = InMemoryStore> {
    inner: Arc<S>,
    lookups: Mutex<HashMap<String, usize>>,
    writes: Mutex<HashMap<String, usize>>,
}

impl<S: KvStore + ?Sized> CountingStore<S> {
    /// Wraps `inner`.
    pub fn new(inner: Arc<S>) -> Self {
        Self {
            inner,
            lookups: Mutex::new(HashMap::new()),
            writes: Mutex::new(HashMap::new()),
        }
    }

    /// Lookups per file id.
    pub fn lookups(&self) -> HashMap<String, usize> {
        self.lookups.lock().clone()
    }

    /// Batch-write submissions per file id, resubmissions included.
    pub fn writes(&self) -> HashMap<String, usize> {
        self.writes.lock().clone()
    }
}

impl<S: KvStore + ?Sized> KvStore for CountingStore<S> {
    fn get_item(&self, table: &str, key: &Item) -> StoreResult<Option<Item>> {
        if let Ok(key) = FileKey::from_item(key) {
            *self.lookups.lock().entry(key.file_id).or_default() += 1;
        }
        self.inner.get_item(table, key)
    }

    fn query(&self, table: &str, query: &Query) -> StoreResult<Vec<Item>> {
        self.inner.query(table, query)
    }

    fn update_item(&self, table: &str, key: &Item, update: &ItemUpdate) -> StoreResult<Item> {
        self.inner.update_item(table, key, update)
    }

    fn put_item(&self, table: &str, item: Item) -> StoreResult<()> {
        self.inner.put_item(table, item)
    }

    fn delete_item(&self, table: &str, key: &Item) -> StoreResult<()> {
        self.inner.delete_item(table, key)
    }

    fn batch_write(&self, table: &str, requests: Vec<WriteRequest>) -> StoreResult<BatchWriteOutput> {
        {
            let mut writes = self.writes.lock();
            for request in &requests {
                if let Ok(key) = FileKey::from_request(request) {
                    *writes.entry(key.file_id).or_default() += 1;
                }
            }
        }
        self.inner.batch_write(table, requests)
    }
}
