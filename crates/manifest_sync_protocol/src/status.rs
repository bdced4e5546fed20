//! File status vocabulary.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Lifecycle status of an uploaded file.
///
/// Variants are declared in lifecycle order, so `Ord` follows the
/// lifecycle. Names are stored verbatim in the `Status` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FileStatus {
    /// Present on the client, not yet known to the server.
    Local,
    /// Registered with the server, upload pending or in flight.
    Registered,
    /// Picked up by the server-side importer.
    Imported,
    /// Import completed on the server.
    Finalized,
    /// Confirmed complete by both sides.
    Verified,
    /// Upload or import failed.
    Failed,
    /// Removed by the client.
    Removed,
    /// No record exists.
    Unknown,
    /// Changed locally since the last sync.
    Changed,
    /// Bytes uploaded by the client.
    Uploaded,
}

/// Which side of the sync may assert a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusSource {
    /// Only the client.
    Client,
    /// Only the server.
    Server,
    /// Either side.
    Both,
}

/// Error returned when parsing an unrecognised status name.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown file status: {0}")]
pub struct UnknownStatus(pub String);

impl FileStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [FileStatus; 10] = [
        FileStatus::Local,
        FileStatus::Registered,
        FileStatus::Imported,
        FileStatus::Finalized,
        FileStatus::Verified,
        FileStatus::Failed,
        FileStatus::Removed,
        FileStatus::Unknown,
        FileStatus::Changed,
        FileStatus::Uploaded,
    ];

    /// Returns the stored name.
    pub fn as_str(&self) -> &'static str {
        match self {
            FileStatus::Local => "Local",
            FileStatus::Registered => "Registered",
            FileStatus::Imported => "Imported",
            FileStatus::Finalized => "Finalized",
            FileStatus::Verified => "Verified",
            FileStatus::Failed => "Failed",
            FileStatus::Removed => "Removed",
            FileStatus::Unknown => "Unknown",
            FileStatus::Changed => "Changed",
            FileStatus::Uploaded => "Uploaded",
        }
    }

    /// Parses a stored name, mapping anything unrecognised to `Unknown`.
    pub fn parse_lossy(name: &str) -> Self {
        name.parse().unwrap_or(FileStatus::Unknown)
    }

    /// Which side may assert this status.
    pub fn source(&self) -> StatusSource {
        match self {
            FileStatus::Registered | FileStatus::Verified | FileStatus::Failed => {
                StatusSource::Both
            }
            FileStatus::Imported | FileStatus::Finalized => StatusSource::Server,
            FileStatus::Local
            | FileStatus::Removed
            | FileStatus::Unknown
            | FileStatus::Changed
            | FileStatus::Uploaded => StatusSource::Client,
        }
    }

    /// Returns true if a client may submit this status.
    pub fn is_client_settable(&self) -> bool {
        matches!(self.source(), StatusSource::Client | StatusSource::Both)
    }

    /// Returns true if the server may assign this status.
    pub fn is_server_settable(&self) -> bool {
        matches!(self.source(), StatusSource::Server | StatusSource::Both)
    }

    /// Returns true while the file belongs in the in-progress index.
    pub fn is_in_progress(&self) -> bool {
        !matches!(
            self,
            FileStatus::Imported | FileStatus::Verified | FileStatus::Finalized | FileStatus::Removed
        )
    }

    /// Returns true once the server has progressed the file past
    /// registration. Records in these states are never deleted or
    /// downgraded by a client submission.
    pub fn is_server_confirmed(&self) -> bool {
        matches!(
            self,
            FileStatus::Imported | FileStatus::Finalized | FileStatus::Verified
        )
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FileStatus::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_roundtrip() {
        for status in FileStatus::ALL {
            assert_eq!(status.as_str().parse::<FileStatus>(), Ok(status));
            assert_eq!(status.to_string(), status.as_str());
        }
    }

    #[test]
    fn lossy_parse() {
        assert_eq!(FileStatus::parse_lossy("Finalized"), FileStatus::Finalized);
        assert_eq!(FileStatus::parse_lossy("finalized"), FileStatus::Unknown);
        assert_eq!(FileStatus::parse_lossy(""), FileStatus::Unknown);
        assert!("Bogus".parse::<FileStatus>().is_err());
    }

    #[test]
    fn lifecycle_order() {
        assert!(FileStatus::Local < FileStatus::Registered);
        assert!(FileStatus::Registered < FileStatus::Imported);
        assert!(FileStatus::Changed < FileStatus::Uploaded);
    }

    #[test]
    fn in_progress_classification() {
        let done = [
            FileStatus::Imported,
            FileStatus::Verified,
            FileStatus::Finalized,
            FileStatus::Removed,
        ];
        for status in FileStatus::ALL {
            assert_eq!(status.is_in_progress(), !done.contains(&status), "{status}");
        }
    }

    #[test]
    fn settable_subsets() {
        assert!(FileStatus::Local.is_client_settable());
        assert!(!FileStatus::Local.is_server_settable());
        assert!(FileStatus::Registered.is_client_settable());
        assert!(FileStatus::Registered.is_server_settable());
        assert!(!FileStatus::Finalized.is_client_settable());
        assert!(FileStatus::Imported.is_server_settable());
    }

    #[test]
    fn serde_uses_stored_names() {
        let json = serde_json::to_string(&FileStatus::Verified).unwrap();
        assert_eq!(json, "\"Verified\"");
        let parsed: FileStatus = serde_json::from_str("\"Changed\"").unwrap();
        assert_eq!(parsed, FileStatus::Changed);
    }
}
