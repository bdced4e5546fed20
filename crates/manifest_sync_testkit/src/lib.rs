//! # Manifest Sync Testkit
//!
//! Test utilities for the manifest sync engine.
//!
//! This crate provides:
//! - Fixtures: seeded stores, engine builders, desired-state builders
//! - Property-based test generators using proptest
//! - Scripted stores that throttle batch writes or fail lookups
//! - Decision-table vectors in JSON
//! - Concurrent sync load helpers
//! - A tracing subscriber for tests
//!
//! ## Usage
//!
//! ```rust
//! use manifest_sync_testkit::prelude::*;
//!
//! let engine = TestEngineBuilder::new().build();
//! let summary = engine
//!     .sync(MANIFEST_ID, desired_batch("u", 3, FileStatus::Local), None, &CancelToken::new())
//!     .unwrap();
//! assert_eq!(summary.files_updated, 3);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod logging;
pub mod stores;
pub mod stress;
pub mod vectors;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::logging::*;
    pub use crate::stores::*;
    pub use crate::stress::*;
    pub use crate::vectors::*;
    pub use manifest_sync_engine::{
        CancelToken, ManifestSyncEngine, RetryConfig, StaticManifestRegistry, SyncConfig,
        SyncError,
    };
    pub use manifest_sync_protocol::{
        DesiredFileState, FailureReason, FileStatus, ManifestFileRecord, SyncSummary,
    };
    pub use manifest_sync_store::{InMemoryStore, KvStore, WriteRequest};
}

pub use fixtures::*;
pub use generators::*;
pub use logging::*;
pub use stores::*;
pub use stress::*;
pub use vectors::*;
