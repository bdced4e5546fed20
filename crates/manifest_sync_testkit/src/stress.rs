//! Concurrent sync load.
//!
//! Runs many sync calls against one engine at once and checks that each
//! call accounts for exactly its own files.

use crate::fixtures::{desired_batch, TestEngine};
use manifest_sync_engine::CancelToken;
use manifest_sync_protocol::{FileStatus, SyncSummary};
use std::thread;
use std::time::{Duration, Instant};

/// Configuration for a concurrent sync run.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Manifests synced concurrently; each is registered by the run.
    pub manifests: usize,
    /// Files per manifest.
    pub files_per_manifest: usize,
    /// Sync calls per manifest, run one after another.
    pub rounds: usize,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            manifests: 4,
            files_per_manifest: 120,
            rounds: 2,
        }
    }
}

/// Result of a concurrent sync run.
#[derive(Debug, Clone)]
pub struct StressTestResult {
    /// Sync calls made.
    pub calls: usize,
    /// Calls whose summary accounted for every submitted file exactly once.
    pub consistent_calls: usize,
    /// Files that ended with a failure.
    pub failed_files: usize,
    /// Total duration.
    pub duration: Duration,
}

impl StressTestResult {
    /// Returns true if every call was consistent and no file failed.
    pub fn is_clean(&self) -> bool {
        self.calls == self.consistent_calls && self.failed_files == 0
    }
}

/// Name of the `index`-th manifest a stress run uses.
pub fn stress_manifest(index: usize) -> String {
    format!("stress-{index}")
}

/// Syncs `config.manifests` manifests concurrently on `engine`.
pub fn run_concurrent_syncs(engine: &TestEngine, config: &StressConfig) -> StressTestResult {
    for index in 0..config.manifests {
        engine.registry().register(stress_manifest(index));
    }

    let start = Instant::now();
    let summaries: Vec<Vec<SyncSummary>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..config.manifests)
            .map(|index| {
                scope.spawn(move || {
                    let manifest_id = stress_manifest(index);
                    (0..config.rounds)
                        .map(|_| {
                            let files = desired_batch(
                                &manifest_id,
                                config.files_per_manifest,
                                FileStatus::Local,
                            );
                            engine
                                .sync(&manifest_id, files, None, &CancelToken::new())
                                .expect("stress manifest is registered")
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("stress thread panicked"))
            .collect()
    });

    let mut result = StressTestResult {
        calls: 0,
        consistent_calls: 0,
        failed_files: 0,
        duration: start.elapsed(),
    };
    for (index, rounds) in summaries.iter().enumerate() {
        let prefix = format!("{}-", stress_manifest(index));
        for summary in rounds {
            result.calls += 1;
            result.failed_files += summary.failures.len();
            let own_files = summary
                .statuses
                .iter()
                .map(|outcome| &outcome.file_id)
                .chain(summary.failures.iter().map(|failure| &failure.file_id))
                .all(|file_id| file_id.starts_with(&prefix));
            if own_files && summary.processed_count() == config.files_per_manifest {
                result.consistent_calls += 1;
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::TestEngineBuilder;

    #[test]
    fn concurrent_manifests_stay_separate() {
        let engine = TestEngineBuilder::new().workers(3).build();
        let config = StressConfig {
            manifests: 3,
            files_per_manifest: 60,
            rounds: 2,
        };
        let result = run_concurrent_syncs(&engine, &config);
        assert_eq!(result.calls, 6);
        assert!(result.is_clean(), "{result:?}");
        assert_eq!(engine.list_files(&stress_manifest(2)).unwrap().len(), 60);
    }
}
