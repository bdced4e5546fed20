//! # Manifest Sync Engine
//!
//! Reconciles client-declared file states for an upload manifest with the
//! statuses persisted in a key-value store.
//!
//! This crate provides:
//! - The reconciliation decision table
//! - Per-file status lookups
//! - Batch writes with resubmission of unprocessed items
//! - A per-call worker pool over a bounded queue
//! - Cancellation and linear backoff
//! - The [`ManifestSyncEngine`] facade
//!
//! ## Architecture
//!
//! A sync call checks the manifest, then fans its files out to a fixed
//! number of worker threads. Each worker takes files from the shared queue
//! in batches, looks up each file's persisted status, decides the write,
//! and submits the batch's writes as one batch write. Results flow back
//! over a channel and are merged into a [`SyncSummary`].
//!
//! ## Key Invariants
//!
//! - Records the server progressed (`Imported`, `Finalized`, `Verified`)
//!   are never deleted or moved backwards by a client submission
//! - A record carries the in-progress marker exactly while its status is
//!   in progress
//! - Every submitted file is reported exactly once, as a status or a
//!   failure
//! - Per-file failures never abort the call
//!
//! ```
//! use manifest_sync_engine::{CancelToken, ManifestSyncEngine, StaticManifestRegistry, SyncConfig};
//! use manifest_sync_protocol::{attrs, DesiredFileState, FileStatus};
//! use manifest_sync_store::{InMemoryStore, TableSchema};
//! use std::sync::Arc;
//!
//! let store = InMemoryStore::new();
//! store.create_table(
//!     "ManifestFiles",
//!     TableSchema::new(attrs::MANIFEST_ID).with_sort_key(attrs::UPLOAD_ID),
//! );
//! let engine = ManifestSyncEngine::new(
//!     SyncConfig::default(),
//!     Arc::new(store),
//!     StaticManifestRegistry::with_manifests(["m-1"]),
//! )
//! .unwrap();
//!
//! let files = vec![DesiredFileState::new("u-1", "scans", "a.tif", FileStatus::Local)];
//! let summary = engine.sync("m-1", files, None, &CancelToken::new()).unwrap();
//! assert_eq!(summary.status_of("u-1"), Some(FileStatus::Registered));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod applier;
mod cancel;
mod config;
mod decision;
mod engine;
mod error;
mod lookup;
mod pool;
mod registry;
mod stats;

pub use applier::{ApplyOutcome, BatchApplier};
pub use cancel::CancelToken;
pub use config::{RetryConfig, SyncConfig, DEFAULT_WORKERS};
pub use decision::{decide, forced};
pub use engine::ManifestSyncEngine;
pub use error::{SyncError, SyncResult};
pub use lookup::StatusLookup;
pub use manifest_sync_protocol::SyncSummary;
pub use pool::SyncWorkerPool;
pub use registry::{ManifestRegistry, StaticManifestRegistry, StoreManifestRegistry};
pub use stats::{BatchReport, EngineStats, StatsAggregator};
