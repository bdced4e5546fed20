//! Property-based test generators using proptest.
//!
//! Provides strategies for statuses, file ids and desired states.

use manifest_sync_protocol::{DesiredFileState, FileStatus};
use proptest::prelude::*;
use std::collections::BTreeMap;

/// Strategy over every status.
pub fn status_strategy() -> impl Strategy<Value = FileStatus> {
    prop::sample::select(FileStatus::ALL.to_vec())
}

/// Strategy over the statuses a client may declare and the table handles.
pub fn handled_status_strategy() -> impl Strategy<Value = FileStatus> {
    prop::sample::select(
        FileStatus::ALL
            .into_iter()
            .filter(|status| *status != FileStatus::Uploaded)
            .collect::<Vec<_>>(),
    )
}

/// Strategy over the statuses only the server reaches.
pub fn server_confirmed_strategy() -> impl Strategy<Value = FileStatus> {
    prop::sample::select(vec![
        FileStatus::Imported,
        FileStatus::Finalized,
        FileStatus::Verified,
    ])
}

/// Strategy for upload ids.
pub fn file_id_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("u-[a-z0-9]{1,12}").expect("Invalid regex")
}

/// Strategy for one desired file state.
pub fn desired_state_strategy() -> impl Strategy<Value = DesiredFileState> {
    (
        file_id_strategy(),
        prop::string::string_regex("[a-z]{1,8}(/[a-z]{1,8}){0,2}").expect("Invalid regex"),
        prop::string::string_regex("[a-z]{1,10}\\.(tif|jpg|pdf)").expect("Invalid regex"),
        handled_status_strategy(),
        prop::option::of(prop::string::string_regex("pkg-[0-9]{1,4}").expect("Invalid regex")),
    )
        .prop_map(|(file_id, path, name, status, target)| {
            let state = DesiredFileState::new(file_id, path, name, status);
            match target {
                Some(target) => state.with_merge_target(target),
                None => state,
            }
        })
}

/// Strategy for desired states with distinct file ids.
pub fn desired_batch_strategy(
    max_files: usize,
) -> impl Strategy<Value = Vec<DesiredFileState>> {
    prop::collection::vec(desired_state_strategy(), 0..=max_files).prop_map(|states| {
        states
            .into_iter()
            .map(|state| (state.file_id.clone(), state))
            .collect::<BTreeMap<_, _>>()
            .into_values()
            .collect()
    })
}

/// Strategy pairing desired states with the statuses to seed beforehand;
/// `None` leaves the file without a record.
pub fn seeded_batch_strategy(
    max_files: usize,
) -> impl Strategy<Value = Vec<(DesiredFileState, Option<FileStatus>)>> {
    desired_batch_strategy(max_files).prop_flat_map(|states| {
        let count = states.len();
        (
            Just(states),
            prop::collection::vec(prop::option::of(handled_status_strategy()), count),
        )
            .prop_map(|(states, seeds)| states.into_iter().zip(seeds).collect())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    proptest! {
        #[test]
        fn batches_have_distinct_ids(batch in desired_batch_strategy(40)) {
            let ids: HashSet<_> = batch.iter().map(|state| &state.file_id).collect();
            prop_assert_eq!(ids.len(), batch.len());
        }

        #[test]
        fn generated_states_validate(state in desired_state_strategy()) {
            prop_assert!(state.validate().is_ok());
            prop_assert!(state.status != FileStatus::Uploaded);
        }
    }
}
