//! Failure isolation: per-file problems never abort a sync call.

use manifest_sync_engine::StaticManifestRegistry;
use manifest_sync_store::StoreError;
use manifest_sync_testkit::prelude::*;
use std::sync::Arc;

type FlakyEngine = ManifestSyncEngine<FlakyLookupStore, StaticManifestRegistry>;

fn flaky_engine(failing: &[&str]) -> FlakyEngine {
    init_test_tracing();
    let store = FlakyLookupStore::new(Arc::new(new_store()));
    for file_id in failing {
        store.fail_lookup(*file_id);
    }
    ManifestSyncEngine::new(
        SyncConfig::new(FILES_TABLE).with_retry(RetryConfig::immediate(5)),
        Arc::new(store),
        StaticManifestRegistry::with_manifests([MANIFEST_ID]),
    )
    .unwrap()
}

#[test]
fn unknown_manifest_is_rejected_before_any_io() {
    init_test_tracing();
    let engine = TestEngineBuilder::new().build();
    let err = engine
        .sync(
            "missing",
            desired_batch("u", 5, FileStatus::Local),
            None,
            &CancelToken::new(),
        )
        .unwrap_err();

    assert!(matches!(err, SyncError::ManifestNotFound { .. }));
    let counters = engine.store().counters();
    assert_eq!(counters.get_calls, 0);
    assert_eq!(counters.batch_write_calls, 0);
}

#[test]
fn lookup_failure_is_isolated() {
    let engine = flaky_engine(&["u-02"]);
    let summary = engine
        .sync(
            MANIFEST_ID,
            desired_batch("u", 5, FileStatus::Local),
            None,
            &CancelToken::new(),
        )
        .unwrap();

    assert_eq!(summary.failed_file_ids(), vec!["u-02"]);
    assert!(matches!(
        summary.failure_of("u-02"),
        Some(FailureReason::Lookup(_))
    ));
    assert_eq!(summary.files_updated, 4);
    let inner = engine.store().inner();
    assert!(stored_record(inner.as_ref(), MANIFEST_ID, "u-02").is_none());
    assert!(stored_record(inner.as_ref(), MANIFEST_ID, "u-03").is_some());
}

#[test]
fn lookup_failure_with_fatal_error() {
    init_test_tracing();
    let store = FlakyLookupStore::new(Arc::new(new_store()))
        .with_error(StoreError::Validation("bad key".into()));
    store.fail_lookup("u-00");
    let engine = ManifestSyncEngine::new(
        SyncConfig::new(FILES_TABLE),
        Arc::new(store),
        StaticManifestRegistry::with_manifests([MANIFEST_ID]),
    )
    .unwrap();

    let summary = engine
        .sync(
            MANIFEST_ID,
            desired_batch("u", 2, FileStatus::Local),
            None,
            &CancelToken::new(),
        )
        .unwrap();
    assert_eq!(summary.failed_file_ids(), vec!["u-00"]);
    assert_eq!(summary.status_of("u-01"), Some(FileStatus::Registered));
}

#[test]
fn unhandled_transition_is_isolated() {
    init_test_tracing();
    let engine = TestEngineBuilder::new().build();
    let summary = engine
        .sync(
            MANIFEST_ID,
            vec![
                desired("u-1", FileStatus::Uploaded),
                desired("u-2", FileStatus::Local),
            ],
            None,
            &CancelToken::new(),
        )
        .unwrap();

    assert_eq!(
        summary.failure_of("u-1"),
        Some(&FailureReason::UnhandledTransition {
            desired: FileStatus::Uploaded,
            current: FileStatus::Unknown,
        })
    );
    assert_eq!(summary.status_of("u-2"), Some(FileStatus::Registered));
    assert!(stored_record(engine.store().as_ref(), MANIFEST_ID, "u-1").is_none());
}

#[test]
fn empty_file_id_is_a_marshal_failure() {
    init_test_tracing();
    let engine = TestEngineBuilder::new().build();
    let summary = engine
        .sync(
            MANIFEST_ID,
            vec![desired("", FileStatus::Local), desired("u-1", FileStatus::Local)],
            None,
            &CancelToken::new(),
        )
        .unwrap();

    assert!(matches!(
        summary.failure_of(""),
        Some(FailureReason::Marshal(_))
    ));
    assert_eq!(summary.files_updated, 1);
}

#[test]
fn cancel_before_start_is_an_error() {
    init_test_tracing();
    let engine = TestEngineBuilder::new().build();
    let cancel = CancelToken::new();
    cancel.cancel();

    assert!(matches!(
        engine.sync(MANIFEST_ID, desired_batch("u", 3, FileStatus::Local), None, &cancel),
        Err(SyncError::Cancelled)
    ));
    assert_eq!(engine.store().counters().get_calls, 0);
}

#[test]
fn cancelled_sync_of_unknown_manifest_is_not_found() {
    init_test_tracing();
    let engine = TestEngineBuilder::new().build();
    let cancel = CancelToken::new();
    cancel.cancel();

    assert!(matches!(
        engine.sync("missing", desired_batch("u", 3, FileStatus::Local), None, &cancel),
        Err(SyncError::ManifestNotFound { .. })
    ));
    assert_eq!(engine.store().counters().get_calls, 0);
}

#[test]
fn cancel_during_write_stops_remaining_batches() {
    init_test_tracing();
    let engine = TestEngineBuilder::new().workers(1).batch_size(5).build();
    let cancel = CancelToken::new();
    let trigger = cancel.clone();
    engine
        .store()
        .set_throttle(move |_: u64, requests: &[WriteRequest]| {
            trigger.cancel();
            (0..requests.len()).collect()
        });

    let summary = engine
        .sync(
            MANIFEST_ID,
            desired_batch("u", 20, FileStatus::Local),
            None,
            &cancel,
        )
        .unwrap();

    assert_eq!(summary.processed_count(), 20);
    assert!(summary
        .failures
        .iter()
        .all(|failure| failure.reason == FailureReason::Cancelled));
    let counters = engine.store().counters();
    assert_eq!(counters.batch_write_calls, 1);
    assert_eq!(counters.get_calls, 5);
    assert_eq!(engine.store().item_count(FILES_TABLE).unwrap(), 0);
}

#[test]
fn duplicate_file_ids_collapse_to_last() {
    init_test_tracing();
    let engine = TestEngineBuilder::new().build();
    seed_status(engine.store().as_ref(), MANIFEST_ID, "u-1", FileStatus::Registered);

    let summary = engine
        .sync(
            MANIFEST_ID,
            vec![
                desired("u-1", FileStatus::Local),
                desired("u-2", FileStatus::Local),
                desired("u-1", FileStatus::Removed),
            ],
            None,
            &CancelToken::new(),
        )
        .unwrap();

    assert_eq!(summary.processed_count(), 2);
    assert_eq!(summary.status_of("u-1"), Some(FileStatus::Removed));
    assert!(stored_record(engine.store().as_ref(), MANIFEST_ID, "u-1").is_none());
}

#[test]
fn missing_table_fails_every_lookup() {
    init_test_tracing();
    let engine = TestEngineBuilder::new()
        .config(SyncConfig::new("NoSuchTable").with_retry(RetryConfig::immediate(5)))
        .build();
    let summary = engine
        .sync(
            MANIFEST_ID,
            desired_batch("u", 3, FileStatus::Local),
            None,
            &CancelToken::new(),
        )
        .unwrap();

    assert_eq!(summary.failures.len(), 3);
    assert!(summary
        .failures
        .iter()
        .all(|failure| matches!(failure.reason, FailureReason::Lookup(_))));
}
