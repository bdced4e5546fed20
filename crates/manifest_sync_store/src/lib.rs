//! # Manifest Sync Store
//!
//! Key-value store client abstraction for the manifest sync engine.
//!
//! This crate provides the lowest-level storage abstraction. Stores hold
//! **attribute maps** keyed by a partition key and an optional sort key;
//! they do not interpret manifest records or file statuses.
//!
//! ## Design Principles
//!
//! - One narrow trait ([`KvStore`]) covering get, query, update, put,
//!   delete and batch-write
//! - Batch writes may leave a subset of requests unprocessed; callers
//!   resubmit exactly that subset
//! - Secondary indexes are sparse: an item missing the index's key
//!   attribute is not indexed
//! - Must be `Send + Sync` for concurrent access
//!
//! ## Available Stores
//!
//! - [`InMemoryStore`] - For testing and embedded use, with an optional
//!   [`ThrottlePolicy`] to simulate partially processed batches
//!
//! ## Example
//!
//! ```rust
//! use manifest_sync_store::{
//!     AttributeValue, InMemoryStore, Item, KvStore, TableSchema, WriteRequest,
//! };
//!
//! let store = InMemoryStore::new();
//! store.create_table("files", TableSchema::new("Pk").with_sort_key("Sk"));
//!
//! let mut item = Item::new();
//! item.insert("Pk".into(), AttributeValue::s("m1"));
//! item.insert("Sk".into(), AttributeValue::s("f1"));
//!
//! let output = store
//!     .batch_write("files", vec![WriteRequest::put(item.clone())])
//!     .unwrap();
//! assert!(output.unprocessed.is_empty());
//! assert_eq!(store.get_item("files", &item).unwrap(), Some(item));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod client;
mod error;
mod item;
mod memory;
mod request;

pub use client::KvStore;
pub use error::{StoreError, StoreResult};
pub use item::{AttributeValue, Item};
pub use memory::{IndexSchema, InMemoryStore, StoreCounters, TableSchema, ThrottlePolicy};
pub use request::{BatchWriteOutput, ItemUpdate, Query, WriteRequest, MAX_BATCH_WRITE};
