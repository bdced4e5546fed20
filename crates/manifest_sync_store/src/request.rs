//! Request and response types for store operations.

use crate::item::{AttributeValue, Item};

/// Maximum number of requests accepted by a single batch write.
pub const MAX_BATCH_WRITE: usize = 25;

/// A single write inside a batch.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteRequest {
    /// Replace the whole item stored under the item's key.
    Put {
        /// The full item, key attributes included.
        item: Item,
    },
    /// Delete the item stored under the key.
    Delete {
        /// Key attributes only.
        key: Item,
    },
}

impl WriteRequest {
    /// Creates a put request.
    pub fn put(item: Item) -> Self {
        WriteRequest::Put { item }
    }

    /// Creates a delete request.
    pub fn delete(key: Item) -> Self {
        WriteRequest::Delete { key }
    }

    /// Returns the attribute map carrying this request's key.
    pub fn key_source(&self) -> &Item {
        match self {
            WriteRequest::Put { item } => item,
            WriteRequest::Delete { key } => key,
        }
    }

    /// Returns true for put requests.
    pub fn is_put(&self) -> bool {
        matches!(self, WriteRequest::Put { .. })
    }
}

/// Result of a batch write.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchWriteOutput {
    /// Requests the store did not apply, e.g. because of throttling.
    pub unprocessed: Vec<WriteRequest>,
}

impl BatchWriteOutput {
    /// Creates an output where every request was applied.
    pub fn complete() -> Self {
        Self::default()
    }

    /// Returns true if nothing was left unprocessed.
    pub fn is_complete(&self) -> bool {
        self.unprocessed.is_empty()
    }
}

/// A partition query against a table or one of its secondary indexes.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// Secondary index to query, or `None` for the table itself.
    pub index_name: Option<String>,
    /// Value the partition key attribute must equal.
    pub partition_value: AttributeValue,
    /// Maximum number of items to return.
    pub limit: Option<usize>,
}

impl Query {
    /// Creates a query for every item in a partition of the table.
    pub fn partition(value: AttributeValue) -> Self {
        Self {
            index_name: None,
            partition_value: value,
            limit: None,
        }
    }

    /// Routes the query through a secondary index.
    pub fn on_index(mut self, index: impl Into<String>) -> Self {
        self.index_name = Some(index.into());
        self
    }

    /// Caps the number of returned items.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Attribute changes applied by an update.
///
/// Removing an attribute deletes it from the item entirely, which is not
/// the same as setting it to an empty string: sparse indexes only drop an
/// item once the attribute is gone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemUpdate {
    /// Attributes to set or overwrite.
    pub set: Item,
    /// Attributes to remove.
    pub remove: Vec<String>,
    /// Fail with a condition error instead of creating a missing item.
    pub require_exists: bool,
}

impl ItemUpdate {
    /// Creates an empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an attribute.
    pub fn set(mut self, name: impl Into<String>, value: AttributeValue) -> Self {
        self.set.insert(name.into(), value);
        self
    }

    /// Removes an attribute.
    pub fn remove(mut self, name: impl Into<String>) -> Self {
        self.remove.push(name.into());
        self
    }

    /// Requires the item to exist already.
    pub fn must_exist(mut self) -> Self {
        self.require_exists = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_builder() {
        let update = ItemUpdate::new()
            .set("Status", AttributeValue::s("Imported"))
            .remove("InProgress")
            .must_exist();

        assert_eq!(update.set.len(), 1);
        assert_eq!(update.remove, vec!["InProgress".to_string()]);
        assert!(update.require_exists);
    }

    #[test]
    fn query_builder() {
        let query = Query::partition(AttributeValue::s("m1"))
            .on_index("InProgressIndex")
            .with_limit(10);

        assert_eq!(query.index_name.as_deref(), Some("InProgressIndex"));
        assert_eq!(query.limit, Some(10));
    }

    #[test]
    fn key_source() {
        let mut key = Item::new();
        key.insert("Pk".into(), AttributeValue::s("a"));
        let delete = WriteRequest::delete(key.clone());
        assert_eq!(delete.key_source(), &key);
        assert!(!delete.is_put());
        assert!(WriteRequest::put(key).is_put());
    }
}
