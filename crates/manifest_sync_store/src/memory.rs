//! In-memory store for testing and embedded use.

use crate::client::KvStore;
use crate::error::{StoreError, StoreResult};
use crate::item::{AttributeValue, Item};
use crate::request::{BatchWriteOutput, ItemUpdate, Query, WriteRequest, MAX_BATCH_WRITE};
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Decides which requests of a batch write come back unprocessed.
///
/// Used to simulate a throttled store. `call` counts batch writes made
/// against the store since the policy was installed, starting at 0.
pub trait ThrottlePolicy: Send + Sync {
    /// Returns positions into `requests` that should be left unprocessed.
    fn unprocessed(&self, call: u64, requests: &[WriteRequest]) -> Vec<usize>;
}

impl<F> ThrottlePolicy for F
where
    F: Fn(u64, &[WriteRequest]) -> Vec<usize> + Send + Sync,
{
    fn unprocessed(&self, call: u64, requests: &[WriteRequest]) -> Vec<usize> {
        self(call, requests)
    }
}

/// Key layout of a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    /// Partition key attribute.
    pub partition_key: String,
    /// Sort key attribute, if the table has a composite key.
    pub sort_key: Option<String>,
    /// Secondary indexes.
    pub indexes: Vec<IndexSchema>,
}

impl TableSchema {
    /// Creates a schema with a simple partition key.
    pub fn new(partition_key: impl Into<String>) -> Self {
        Self {
            partition_key: partition_key.into(),
            sort_key: None,
            indexes: Vec::new(),
        }
    }

    /// Adds a sort key.
    pub fn with_sort_key(mut self, sort_key: impl Into<String>) -> Self {
        self.sort_key = Some(sort_key.into());
        self
    }

    /// Adds a secondary index.
    pub fn with_index(mut self, index: IndexSchema) -> Self {
        self.indexes.push(index);
        self
    }
}

/// A sparse secondary index.
///
/// Only items that carry both `partition_key` and `sort_key` attributes
/// appear in the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSchema {
    /// Index name.
    pub name: String,
    /// Partition key attribute of the index.
    pub partition_key: String,
    /// Sort key attribute of the index.
    pub sort_key: String,
}

impl IndexSchema {
    /// Creates an index definition.
    pub fn new(
        name: impl Into<String>,
        partition_key: impl Into<String>,
        sort_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            partition_key: partition_key.into(),
            sort_key: sort_key.into(),
        }
    }
}

/// Call counters, useful for asserting on store traffic in tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreCounters {
    /// Point reads.
    pub get_calls: u64,
    /// Queries.
    pub query_calls: u64,
    /// Updates.
    pub update_calls: u64,
    /// Batch write calls.
    pub batch_write_calls: u64,
    /// Requests submitted across all batch writes.
    pub batch_requests: u64,
    /// Requests returned unprocessed across all batch writes.
    pub unprocessed_requests: u64,
}

type StoredKey = (String, String);

#[derive(Debug)]
struct Table {
    schema: TableSchema,
    items: BTreeMap<StoredKey, Item>,
}

impl Table {
    fn key_of(&self, source: &Item) -> StoreResult<StoredKey> {
        let partition = key_string(source, &self.schema.partition_key)?;
        let sort = match &self.schema.sort_key {
            Some(name) => key_string(source, name)?,
            None => String::new(),
        };
        Ok((partition, sort))
    }

    fn is_key_attribute(&self, name: &str) -> bool {
        self.schema.partition_key == name || self.schema.sort_key.as_deref() == Some(name)
    }

    fn index(&self, table: &str, name: &str) -> StoreResult<&IndexSchema> {
        self.schema
            .indexes
            .iter()
            .find(|index| index.name == name)
            .ok_or_else(|| StoreError::IndexNotFound {
                table: table.to_string(),
                index: name.to_string(),
            })
    }
}

fn key_string(source: &Item, name: &str) -> StoreResult<String> {
    match source.get(name) {
        Some(value) => scalar_string(value).ok_or_else(|| {
            StoreError::Validation(format!(
                "key attribute {name} must be S or N, got {}",
                value.type_name()
            ))
        }),
        None => Err(StoreError::MissingKey(name.to_string())),
    }
}

fn scalar_string(value: &AttributeValue) -> Option<String> {
    match value {
        AttributeValue::S(s) | AttributeValue::N(s) => Some(s.clone()),
        AttributeValue::Bool(_) => None,
    }
}

/// An in-memory key-value store.
///
/// # Thread Safety
///
/// Tables sit behind a single `RwLock`; every operation, including each
/// batch write, is applied under one lock acquisition.
///
/// # Example
///
/// ```rust
/// use manifest_sync_store::{AttributeValue, InMemoryStore, Item, KvStore, Query, TableSchema};
///
/// let store = InMemoryStore::new();
/// store.create_table("manifests", TableSchema::new("ManifestId"));
///
/// let mut item = Item::new();
/// item.insert("ManifestId".into(), AttributeValue::s("m1"));
/// store.put_item("manifests", item).unwrap();
///
/// let found = store
///     .query("manifests", &Query::partition(AttributeValue::s("m1")))
///     .unwrap();
/// assert_eq!(found.len(), 1);
/// ```
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<HashMap<String, Table>>,
    throttle: RwLock<Option<Arc<dyn ThrottlePolicy>>>,
    throttle_calls: AtomicU64,
    counters: Mutex<StoreCounters>,
}

impl fmt::Debug for InMemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryStore")
            .field("tables", &self.tables.read().keys().collect::<Vec<_>>())
            .field("throttled", &self.throttle.read().is_some())
            .finish()
    }
}

impl InMemoryStore {
    /// Creates a store with no tables.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a table. Recreating an existing table drops its items.
    pub fn create_table(&self, name: impl Into<String>, schema: TableSchema) {
        self.tables.write().insert(
            name.into(),
            Table {
                schema,
                items: BTreeMap::new(),
            },
        );
    }

    /// Returns true if the table exists.
    pub fn has_table(&self, name: &str) -> bool {
        self.tables.read().contains_key(name)
    }

    /// Number of items in a table.
    pub fn item_count(&self, table: &str) -> StoreResult<usize> {
        let tables = self.tables.read();
        let table = tables
            .get(table)
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))?;
        Ok(table.items.len())
    }

    /// Returns a copy of every item in a table, in key order.
    pub fn items(&self, table: &str) -> StoreResult<Vec<Item>> {
        let tables = self.tables.read();
        let table = tables
            .get(table)
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))?;
        Ok(table.items.values().cloned().collect())
    }

    /// Installs a throttle policy and resets its call counter.
    pub fn set_throttle(&self, policy: impl ThrottlePolicy + 'static) {
        self.throttle_calls.store(0, Ordering::SeqCst);
        *self.throttle.write() = Some(Arc::new(policy));
    }

    /// Removes the throttle policy.
    pub fn clear_throttle(&self) {
        *self.throttle.write() = None;
    }

    /// Returns a snapshot of the call counters.
    pub fn counters(&self) -> StoreCounters {
        *self.counters.lock()
    }

    fn unprocessed_positions(&self, requests: &[WriteRequest]) -> BTreeSet<usize> {
        let policy = self.throttle.read().clone();
        match policy {
            Some(policy) => {
                let call = self.throttle_calls.fetch_add(1, Ordering::SeqCst);
                policy
                    .unprocessed(call, requests)
                    .into_iter()
                    .filter(|&pos| pos < requests.len())
                    .collect()
            }
            None => BTreeSet::new(),
        }
    }
}

impl KvStore for InMemoryStore {
    fn get_item(&self, table: &str, key: &Item) -> StoreResult<Option<Item>> {
        self.counters.lock().get_calls += 1;

        let tables = self.tables.read();
        let table = tables
            .get(table)
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))?;
        let key = table.key_of(key)?;
        Ok(table.items.get(&key).cloned())
    }

    fn query(&self, table_name: &str, query: &Query) -> StoreResult<Vec<Item>> {
        self.counters.lock().query_calls += 1;

        let tables = self.tables.read();
        let table = tables
            .get(table_name)
            .ok_or_else(|| StoreError::TableNotFound(table_name.to_string()))?;
        let limit = query.limit.unwrap_or(usize::MAX);

        match &query.index_name {
            None => {
                let partition = scalar_string(&query.partition_value).ok_or_else(|| {
                    StoreError::Validation("partition value must be S or N".into())
                })?;
                Ok(table
                    .items
                    .iter()
                    .filter(|((pk, _), _)| *pk == partition)
                    .map(|(_, item)| item.clone())
                    .take(limit)
                    .collect())
            }
            Some(index_name) => {
                let index = table.index(table_name, index_name)?;
                let mut hits: Vec<(String, &StoredKey, &Item)> = table
                    .items
                    .iter()
                    .filter(|(_, item)| {
                        item.get(&index.partition_key) == Some(&query.partition_value)
                    })
                    .filter_map(|(key, item)| {
                        item.get(&index.sort_key)
                            .and_then(scalar_string)
                            .map(|sort| (sort, key, item))
                    })
                    .collect();
                hits.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)));
                Ok(hits
                    .into_iter()
                    .map(|(_, _, item)| item.clone())
                    .take(limit)
                    .collect())
            }
        }
    }

    fn update_item(&self, table: &str, key: &Item, update: &ItemUpdate) -> StoreResult<Item> {
        self.counters.lock().update_calls += 1;

        let mut tables = self.tables.write();
        let table = tables
            .get_mut(table)
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))?;
        let stored_key = table.key_of(key)?;

        for name in update.set.keys().chain(update.remove.iter()) {
            if table.is_key_attribute(name) {
                return Err(StoreError::Validation(format!(
                    "cannot update key attribute {name}"
                )));
            }
        }

        let mut item = match table.items.get(&stored_key) {
            Some(existing) => existing.clone(),
            None if update.require_exists => {
                return Err(StoreError::ConditionFailed(format!(
                    "item {}/{} does not exist",
                    stored_key.0, stored_key.1
                )));
            }
            None => key
                .iter()
                .filter(|(name, _)| table.is_key_attribute(name))
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
        };

        for (name, value) in &update.set {
            item.insert(name.clone(), value.clone());
        }
        for name in &update.remove {
            item.remove(name);
        }

        table.items.insert(stored_key, item.clone());
        Ok(item)
    }

    fn put_item(&self, table: &str, item: Item) -> StoreResult<()> {
        let mut tables = self.tables.write();
        let table = tables
            .get_mut(table)
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))?;
        let key = table.key_of(&item)?;
        table.items.insert(key, item);
        Ok(())
    }

    fn delete_item(&self, table: &str, key: &Item) -> StoreResult<()> {
        let mut tables = self.tables.write();
        let table = tables
            .get_mut(table)
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))?;
        let key = table.key_of(key)?;
        table.items.remove(&key);
        Ok(())
    }

    fn batch_write(
        &self,
        table_name: &str,
        requests: Vec<WriteRequest>,
    ) -> StoreResult<BatchWriteOutput> {
        if requests.is_empty() {
            return Err(StoreError::Validation(
                "batch write must contain at least one request".into(),
            ));
        }
        if requests.len() > MAX_BATCH_WRITE {
            return Err(StoreError::Validation(format!(
                "batch write of {} requests exceeds the limit of {MAX_BATCH_WRITE}",
                requests.len()
            )));
        }

        let mut tables = self.tables.write();
        let table = tables
            .get_mut(table_name)
            .ok_or_else(|| StoreError::TableNotFound(table_name.to_string()))?;

        let mut keys = Vec::with_capacity(requests.len());
        let mut seen = BTreeSet::new();
        for request in &requests {
            let key = table.key_of(request.key_source())?;
            if !seen.insert(key.clone()) {
                return Err(StoreError::Validation(format!(
                    "batch write addresses key {}/{} more than once",
                    key.0, key.1
                )));
            }
            keys.push(key);
        }

        let skipped = self.unprocessed_positions(&requests);
        let mut output = BatchWriteOutput::complete();

        for (pos, (request, key)) in requests.into_iter().zip(keys).enumerate() {
            if skipped.contains(&pos) {
                output.unprocessed.push(request);
                continue;
            }
            match request {
                WriteRequest::Put { item } => {
                    table.items.insert(key, item);
                }
                WriteRequest::Delete { .. } => {
                    table.items.remove(&key);
                }
            }
        }

        let mut counters = self.counters.lock();
        counters.batch_write_calls += 1;
        counters.batch_requests += seen.len() as u64;
        counters.unprocessed_requests += output.unprocessed.len() as u64;

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn files_schema() -> TableSchema {
        TableSchema::new("Pk")
            .with_sort_key("Sk")
            .with_index(IndexSchema::new("Open", "Pk", "Flag"))
    }

    fn item(pk: &str, sk: &str) -> Item {
        let mut item = Item::new();
        item.insert("Pk".into(), AttributeValue::s(pk));
        item.insert("Sk".into(), AttributeValue::s(sk));
        item
    }

    fn store() -> InMemoryStore {
        let store = InMemoryStore::new();
        store.create_table("files", files_schema());
        store
    }

    #[test]
    fn put_get_delete() {
        let store = store();
        let mut it = item("m", "a");
        it.insert("Data".into(), AttributeValue::n(7));

        store.put_item("files", it.clone()).unwrap();
        assert_eq!(store.get_item("files", &item("m", "a")).unwrap(), Some(it));

        store.delete_item("files", &item("m", "a")).unwrap();
        assert_eq!(store.get_item("files", &item("m", "a")).unwrap(), None);
    }

    #[test]
    fn missing_table_and_key() {
        let store = store();
        assert_eq!(
            store.get_item("nope", &item("m", "a")),
            Err(StoreError::TableNotFound("nope".into()))
        );

        let mut partial = Item::new();
        partial.insert("Pk".into(), AttributeValue::s("m"));
        assert_eq!(
            store.get_item("files", &partial),
            Err(StoreError::MissingKey("Sk".into()))
        );
    }

    #[test]
    fn query_partition_in_sort_order() {
        let store = store();
        for sk in ["c", "a", "b"] {
            store.put_item("files", item("m", sk)).unwrap();
        }
        store.put_item("files", item("other", "z")).unwrap();

        let found = store
            .query("files", &Query::partition(AttributeValue::s("m")))
            .unwrap();
        let sorts: Vec<_> = found.iter().map(|i| i["Sk"].as_s().unwrap()).collect();
        assert_eq!(sorts, vec!["a", "b", "c"]);
    }

    #[test]
    fn sparse_index_skips_items_without_attribute() {
        let store = store();
        let mut open = item("m", "a");
        open.insert("Flag".into(), AttributeValue::s("x"));
        store.put_item("files", open).unwrap();
        store.put_item("files", item("m", "b")).unwrap();

        let query = Query::partition(AttributeValue::s("m")).on_index("Open");
        let found = store.query("files", &query).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0]["Sk"].as_s(), Some("a"));

        let update = ItemUpdate::new().remove("Flag");
        store.update_item("files", &item("m", "a"), &update).unwrap();
        assert!(store.query("files", &query).unwrap().is_empty());
    }

    #[test]
    fn unknown_index() {
        let store = store();
        let query = Query::partition(AttributeValue::s("m")).on_index("Missing");
        assert!(matches!(
            store.query("files", &query),
            Err(StoreError::IndexNotFound { .. })
        ));
    }

    #[test]
    fn update_creates_or_requires_item() {
        let store = store();
        let update = ItemUpdate::new().set("Status", AttributeValue::s("Imported"));

        let strict = update.clone().must_exist();
        assert!(matches!(
            store.update_item("files", &item("m", "a"), &strict),
            Err(StoreError::ConditionFailed(_))
        ));

        let created = store.update_item("files", &item("m", "a"), &update).unwrap();
        assert_eq!(created["Status"].as_s(), Some("Imported"));
        assert_eq!(created["Pk"].as_s(), Some("m"));

        let key_change = ItemUpdate::new().set("Sk", AttributeValue::s("b"));
        assert!(matches!(
            store.update_item("files", &item("m", "a"), &key_change),
            Err(StoreError::Validation(_))
        ));
    }

    #[test]
    fn batch_write_limits() {
        let store = store();
        assert!(matches!(
            store.batch_write("files", vec![]),
            Err(StoreError::Validation(_))
        ));

        let too_many: Vec<_> = (0..=MAX_BATCH_WRITE)
            .map(|i| WriteRequest::put(item("m", &i.to_string())))
            .collect();
        assert!(matches!(
            store.batch_write("files", too_many),
            Err(StoreError::Validation(_))
        ));

        let duplicated = vec![
            WriteRequest::put(item("m", "a")),
            WriteRequest::delete(item("m", "a")),
        ];
        assert!(matches!(
            store.batch_write("files", duplicated),
            Err(StoreError::Validation(_))
        ));
        assert_eq!(store.item_count("files").unwrap(), 0);
    }

    #[test]
    fn throttle_leaves_requests_unprocessed() {
        let store = store();
        store.set_throttle(|call: u64, _: &[WriteRequest]| {
            if call == 0 {
                vec![0, 2]
            } else {
                vec![]
            }
        });

        let requests: Vec<_> = ["a", "b", "c"]
            .iter()
            .map(|sk| WriteRequest::put(item("m", sk)))
            .collect();
        let output = store.batch_write("files", requests).unwrap();
        assert_eq!(output.unprocessed.len(), 2);
        assert_eq!(store.item_count("files").unwrap(), 1);

        let output = store.batch_write("files", output.unprocessed).unwrap();
        assert!(output.is_complete());
        assert_eq!(store.item_count("files").unwrap(), 3);

        let counters = store.counters();
        assert_eq!(counters.batch_write_calls, 2);
        assert_eq!(counters.batch_requests, 5);
        assert_eq!(counters.unprocessed_requests, 2);
    }

    #[test]
    fn simple_key_table() {
        let store = InMemoryStore::new();
        store.create_table("manifests", TableSchema::new("Id"));
        let mut it = Item::new();
        it.insert("Id".into(), AttributeValue::s("m1"));
        store.put_item("manifests", it.clone()).unwrap();
        assert!(store.get_item("manifests", &it).unwrap().is_some());
        assert!(store.has_table("manifests"));
    }

    proptest! {
        #[test]
        fn throttled_batch_splits_cleanly(
            mask in prop::collection::vec(any::<bool>(), 1..=MAX_BATCH_WRITE),
        ) {
            let store = store();
            let skipped: Vec<usize> = (0..mask.len()).filter(|pos| mask[*pos]).collect();
            let policy = skipped.clone();
            store.set_throttle(move |_: u64, _: &[WriteRequest]| policy.clone());

            let requests: Vec<_> = (0..mask.len())
                .map(|i| WriteRequest::put(item("m", &format!("{i:02}"))))
                .collect();
            let output = store.batch_write("files", requests).unwrap();

            prop_assert_eq!(output.unprocessed.len(), skipped.len());
            prop_assert_eq!(store.item_count("files").unwrap(), mask.len() - skipped.len());
            for (pos, left_out) in mask.iter().enumerate() {
                let stored = store.get_item("files", &item("m", &format!("{pos:02}"))).unwrap();
                prop_assert_eq!(stored.is_none(), *left_out);
            }
        }
    }
}
