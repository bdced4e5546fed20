//! Store client trait definition.

use crate::error::StoreResult;
use crate::item::Item;
use crate::request::{BatchWriteOutput, ItemUpdate, Query, WriteRequest};
use std::sync::Arc;

/// A key-value store client.
///
/// Items live in named tables and are addressed by a key made of the
/// table's partition key attribute and, if the table has one, its sort key
/// attribute. Keys are passed as attribute maps; extra attributes in a key
/// map are ignored, so a full item can be used as its own key.
///
/// # Invariants
///
/// - `put_item`, `delete_item` and each request of a `batch_write` are
///   atomic per item
/// - `batch_write` accepts at most [`crate::MAX_BATCH_WRITE`] requests and
///   reports every request it did not apply in
///   [`BatchWriteOutput::unprocessed`]
/// - Index queries only see items carrying the index's key attributes
///
/// # Implementors
///
/// - [`crate::InMemoryStore`] - For testing and embedded use
pub trait KvStore: Send + Sync {
    /// Reads a single item by key.
    ///
    /// Returns `Ok(None)` when the item does not exist. Implementations may
    /// instead return [`crate::StoreError::ItemNotFound`].
    fn get_item(&self, table: &str, key: &Item) -> StoreResult<Option<Item>>;

    /// Returns the items of one partition, ordered by sort key.
    fn query(&self, table: &str, query: &Query) -> StoreResult<Vec<Item>>;

    /// Applies attribute changes to one item and returns the updated item.
    ///
    /// Creates the item when it is missing unless
    /// [`ItemUpdate::require_exists`] is set.
    fn update_item(&self, table: &str, key: &Item, update: &ItemUpdate) -> StoreResult<Item>;

    /// Writes a whole item, replacing any previous item with the same key.
    fn put_item(&self, table: &str, item: Item) -> StoreResult<()>;

    /// Deletes an item. Deleting an absent item is not an error.
    fn delete_item(&self, table: &str, key: &Item) -> StoreResult<()>;

    /// Applies up to [`crate::MAX_BATCH_WRITE`] puts and deletes.
    ///
    /// # Errors
    ///
    /// Returns an error if the batch is empty, too large, or addresses the
    /// same key twice, or if the store rejects the whole call.
    fn batch_write(&self, table: &str, requests: Vec<WriteRequest>)
        -> StoreResult<BatchWriteOutput>;
}

impl<S: KvStore + ?Sized> KvStore for Arc<S> {
    fn get_item(&self, table: &str, key: &Item) -> StoreResult<Option<Item>> {
        (**self).get_item(table, key)
    }

    fn query(&self, table: &str, query: &Query) -> StoreResult<Vec<Item>> {
        (**self).query(table, query)
    }

    fn update_item(&self, table: &str, key: &Item, update: &ItemUpdate) -> StoreResult<Item> {
        (**self).update_item(table, key, update)
    }

    fn put_item(&self, table: &str, item: Item) -> StoreResult<()> {
        (**self).put_item(table, item)
    }

    fn delete_item(&self, table: &str, key: &Item) -> StoreResult<()> {
        (**self).delete_item(table, key)
    }

    fn batch_write(
        &self,
        table: &str,
        requests: Vec<WriteRequest>,
    ) -> StoreResult<BatchWriteOutput> {
        (**self).batch_write(table, requests)
    }
}
