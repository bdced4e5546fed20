//! Reconciliation of a client-declared file state against the persisted
//! status.
//!
//! The client-declared status is the primary switch and the persisted
//! status the secondary one. Once the server has progressed a file to
//! `Imported`, `Finalized` or `Verified`, no client submission deletes it
//! or moves it back; the authoritative status is reported instead, and a
//! `Finalized` record is promoted to `Verified` the next time the client
//! mentions it.
//!
//! | desired                          | current                              | result                          |
//! |----------------------------------|--------------------------------------|---------------------------------|
//! | `Removed`                        | `Finalized`                          | put `Verified`                  |
//! | `Removed`                        | `Imported`, `Verified`               | keep current                    |
//! | `Removed`                        | anything else                        | delete, `Removed`               |
//! | `Local`, `Failed`                | `Finalized`                          | put `Verified`                  |
//! | `Local`, `Failed`                | `Registered`, `Failed`, `Unknown`    | put `Registered`, in progress   |
//! | `Local`, `Failed`                | anything else                        | keep current                    |
//! | `Imported`                       | `Finalized`                          | put `Verified`                  |
//! | `Imported`                       | anything else                        | keep current                    |
//! | `Registered`, `Changed`, `Unknown` | `Registered`                       | put `Registered`, in progress   |
//! | `Registered`, `Changed`, `Unknown` | `Finalized`, `Imported`, `Verified`| put `Verified`                  |
//! | `Registered`, `Changed`, `Unknown` | anything else                      | keep current                    |
//! | `Finalized`, `Verified`          | any                                  | keep current                    |
//! | `Uploaded`                       | any                                  | unhandled transition            |

use crate::error::{SyncError, SyncResult};
use manifest_sync_protocol::{Decision, DesiredFileState, FileKey, FileStatus};

/// Decides the write that reconciles `desired` with the persisted
/// `current` status.
///
/// Pure: the same inputs always produce the same decision.
///
/// # Errors
///
/// Returns [`SyncError::UnhandledTransition`] for combinations the table
/// does not cover.
pub fn decide(
    manifest_id: &str,
    desired: &DesiredFileState,
    current: FileStatus,
) -> SyncResult<Decision> {
    use FileStatus::*;

    let decision = match (desired.status, current) {
        (Removed, Finalized) => verified(manifest_id, desired),
        (Removed, Imported | Verified) => Decision::keep(current),
        (Removed, _) => Decision::delete(FileKey::new(manifest_id, &desired.file_id)),

        (Local | Failed, Finalized) => verified(manifest_id, desired),
        (Local | Failed, Registered | Failed | Unknown) => registered(manifest_id, desired),
        (Local | Failed, _) => Decision::keep(current),

        (Imported, Finalized) => verified(manifest_id, desired),
        (Imported, _) => Decision::keep(current),

        (Registered | Changed | Unknown, Registered) => registered(manifest_id, desired),
        (Registered | Changed | Unknown, Finalized | Imported | Verified) => {
            verified(manifest_id, desired)
        }
        (Registered | Changed | Unknown, _) => Decision::keep(current),

        (Finalized | Verified, _) => Decision::keep(current),

        (Uploaded, _) => {
            return Err(SyncError::UnhandledTransition {
                manifest_id: manifest_id.to_string(),
                file_id: desired.file_id.clone(),
                desired: desired.status,
                current,
            })
        }
    };

    Ok(decision)
}

/// Writes `desired` with the caller-supplied `status`, bypassing the
/// reconciliation table. The in-progress marker follows the status alone.
pub fn forced(manifest_id: &str, desired: &DesiredFileState, status: FileStatus) -> Decision {
    Decision::put(desired.to_record(manifest_id, status, status.is_in_progress()))
}

fn registered(manifest_id: &str, desired: &DesiredFileState) -> Decision {
    Decision::put(desired.to_record(manifest_id, FileStatus::Registered, true))
}

// Verified records never carry the in-progress marker.
fn verified(manifest_id: &str, desired: &DesiredFileState) -> Decision {
    Decision::put(desired.to_record(manifest_id, FileStatus::Verified, false))
}
