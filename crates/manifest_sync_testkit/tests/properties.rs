//! Property tests over whole sync calls.

use manifest_sync_testkit::prelude::*;
use proptest::prelude::*;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

fn seeded_engine(seeds: &[(DesiredFileState, Option<FileStatus>)]) -> TestEngine {
    let engine = TestEngineBuilder::new().workers(3).batch_size(7).build();
    for (state, seed) in seeds {
        if let Some(status) = seed {
            seed_status(engine.store().as_ref(), MANIFEST_ID, &state.file_id, *status);
        }
    }
    engine
}

fn snapshot(engine: &TestEngine) -> BTreeMap<String, ManifestFileRecord> {
    engine
        .list_files(MANIFEST_ID)
        .unwrap()
        .into_iter()
        .map(|record| (record.file_id.clone(), record))
        .collect()
}

#[test]
fn each_file_is_looked_up_and_written_once() {
    init_test_tracing();
    let store = Arc::new(CountingStore::new(Arc::new(new_store())));
    let engine = ManifestSyncEngine::new(
        SyncConfig::new(FILES_TABLE)
            .with_workers(4)
            .with_batch_size(7)
            .with_queue_capacity(3)
            .with_retry(RetryConfig::immediate(5)),
        Arc::clone(&store),
        StaticManifestRegistry::with_manifests([MANIFEST_ID]),
    )
    .unwrap();

    let summary = engine
        .sync(
            MANIFEST_ID,
            desired_batch("u", 503, FileStatus::Local),
            None,
            &CancelToken::new(),
        )
        .unwrap();
    assert_eq!(summary.processed_count(), 503);
    assert!(summary.is_clean());

    let lookups = store.lookups();
    assert_eq!(lookups.len(), 503);
    assert!(lookups.values().all(|count| *count == 1), "{lookups:?}");
    let writes = store.writes();
    assert_eq!(writes.len(), 503);
    assert!(writes.values().all(|count| *count == 1), "{writes:?}");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn server_confirmed_files_survive_any_submission(
        files in desired_batch_strategy(30),
        seeds in prop::collection::vec(server_confirmed_strategy(), 30),
    ) {
        let seeded: Vec<_> = files.into_iter().zip(seeds).collect();
        let engine = TestEngineBuilder::new().workers(3).batch_size(7).build();
        for (state, seed) in &seeded {
            seed_status(engine.store().as_ref(), MANIFEST_ID, &state.file_id, *seed);
        }
        let files: Vec<_> = seeded.iter().map(|(state, _)| state.clone()).collect();
        let summary = engine.sync(MANIFEST_ID, files, None, &CancelToken::new()).unwrap();

        prop_assert_eq!(summary.files_removed, 0);
        let after = snapshot(&engine);
        prop_assert_eq!(after.len(), seeded.len());
        for (state, seed) in &seeded {
            let reported = summary.status_of(&state.file_id);
            prop_assert!(
                reported == Some(*seed) || reported == Some(FileStatus::Verified),
                "{} reported {:?} over {}",
                state.file_id,
                reported,
                seed
            );
            prop_assert_eq!(after.get(&state.file_id).map(|record| record.status), reported);
        }
    }

    #[test]
    fn every_file_reported_exactly_once(seeded in seeded_batch_strategy(40)) {
        let engine = seeded_engine(&seeded);
        let files: Vec<_> = seeded.iter().map(|(state, _)| state.clone()).collect();
        let summary = engine.sync(MANIFEST_ID, files, None, &CancelToken::new()).unwrap();

        let mut seen = HashSet::new();
        for id in summary
            .statuses
            .iter()
            .map(|outcome| &outcome.file_id)
            .chain(summary.failures.iter().map(|failure| &failure.file_id))
        {
            prop_assert!(seen.insert(id.clone()), "{} reported twice", id);
        }
        prop_assert_eq!(seen.len(), seeded.len());
        prop_assert!(summary.is_clean());
    }

    #[test]
    fn server_progress_is_never_undone(seeded in seeded_batch_strategy(30)) {
        let engine = seeded_engine(&seeded);
        let files: Vec<_> = seeded.iter().map(|(state, _)| state.clone()).collect();
        engine.sync(MANIFEST_ID, files, None, &CancelToken::new()).unwrap();

        let after = snapshot(&engine);
        for (state, seed) in &seeded {
            if let Some(seed) = seed.filter(|status| status.is_server_confirmed()) {
                let record = after.get(&state.file_id);
                prop_assert!(record.is_some(), "{} was deleted", state.file_id);
                if let Some(record) = record {
                    prop_assert!(
                        record.status == seed || record.status == FileStatus::Verified,
                        "{} moved from {} to {}",
                        state.file_id,
                        seed,
                        record.status
                    );
                }
            }
        }
    }

    #[test]
    fn marker_tracks_status(seeded in seeded_batch_strategy(30)) {
        let engine = seeded_engine(&seeded);
        let files: Vec<_> = seeded.iter().map(|(state, _)| state.clone()).collect();
        engine.sync(MANIFEST_ID, files, None, &CancelToken::new()).unwrap();

        let records = engine.list_files(MANIFEST_ID).unwrap();
        for record in &records {
            prop_assert_eq!(record.in_progress, record.status.is_in_progress());
        }
        let indexed = engine.in_progress_files(MANIFEST_ID).unwrap();
        prop_assert_eq!(
            indexed.len(),
            records.iter().filter(|record| record.in_progress).count()
        );
    }

    #[test]
    fn repeating_a_sync_changes_nothing(seeded in seeded_batch_strategy(30)) {
        let engine = seeded_engine(&seeded);
        let files: Vec<_> = seeded.iter().map(|(state, _)| state.clone()).collect();

        let first = engine.sync(MANIFEST_ID, files.clone(), None, &CancelToken::new()).unwrap();
        let stored = snapshot(&engine);
        let second = engine.sync(MANIFEST_ID, files, None, &CancelToken::new()).unwrap();

        for outcome in &first.statuses {
            prop_assert_eq!(second.status_of(&outcome.file_id), Some(outcome.status));
        }
        prop_assert_eq!(snapshot(&engine), stored);
    }
}
