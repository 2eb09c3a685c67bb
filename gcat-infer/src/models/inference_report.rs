//! Inference run report
//!
//! The report is the only user-visible artifact of a run. Every skipped
//! singer is listed with a typed reason so that operators can tell
//! "nothing to infer from" apart from genuine failures.

use chrono::{DateTime, Utc};
use gcat_common::db::SingerId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a singer's inferred genre was not written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "cause", rename_all = "snake_case")]
pub enum SkipReason {
    /// Singer disappeared between listing and processing
    SingerNotFound,
    /// No playlist containing the singer's songs carries a genre
    NoGenreTaggedPlaylists,
    /// Reading songs, memberships or playlists failed
    TraversalFailed(String),
    /// Write-back of the inferred genre failed
    PersistenceFailed(String),
}

impl SkipReason {
    /// True for skips caused by an error rather than by the data
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            SkipReason::TraversalFailed(_) | SkipReason::PersistenceFailed(_)
        )
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::SingerNotFound => f.write_str("singer not found"),
            SkipReason::NoGenreTaggedPlaylists => f.write_str("no genre-tagged playlists"),
            SkipReason::TraversalFailed(cause) => write!(f, "playlist traversal failed: {}", cause),
            SkipReason::PersistenceFailed(cause) => write!(f, "write-back failed: {}", cause),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedSinger {
    pub singer_id: SingerId,
    pub reason: SkipReason,
}

/// Outcome of one `run_inference` batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub singers_examined: usize,
    /// Singers whose inferred genre was written
    pub updated: usize,
    /// Singers left unchanged, in processing order
    pub skipped: Vec<SkippedSinger>,
}

impl InferenceReport {
    /// Skips caused by errors
    pub fn failures(&self) -> impl Iterator<Item = &SkippedSinger> {
        self.skipped.iter().filter(|s| s.reason.is_failure())
    }

    /// True when no singer was skipped because of an error
    pub fn is_clean(&self) -> bool {
        self.failures().next().is_none()
    }

    /// Compare two reports ignoring their timestamps
    pub fn same_outcome(&self, other: &InferenceReport) -> bool {
        self.singers_examined == other.singers_examined
            && self.updated == other.updated
            && self.skipped == other.skipped
    }

    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(skipped: Vec<SkippedSinger>) -> InferenceReport {
        let now = Utc::now();
        InferenceReport {
            started_at: now,
            finished_at: now,
            singers_examined: 3,
            updated: 3 - skipped.len(),
            skipped,
        }
    }

    #[test]
    fn test_no_playlists_is_not_a_failure() {
        let report = report(vec![SkippedSinger {
            singer_id: 1,
            reason: SkipReason::NoGenreTaggedPlaylists,
        }]);

        assert!(report.is_clean());
        assert_eq!(report.failures().count(), 0);
    }

    #[test]
    fn test_persistence_failure_is_reported() {
        let report = report(vec![
            SkippedSinger {
                singer_id: 1,
                reason: SkipReason::NoGenreTaggedPlaylists,
            },
            SkippedSinger {
                singer_id: 2,
                reason: SkipReason::PersistenceFailed("disk full".into()),
            },
        ]);

        assert!(!report.is_clean());
        let failed: Vec<SingerId> = report.failures().map(|s| s.singer_id).collect();
        assert_eq!(failed, vec![2]);
    }

    #[test]
    fn test_reason_text() {
        assert_eq!(
            SkipReason::NoGenreTaggedPlaylists.to_string(),
            "no genre-tagged playlists"
        );
        assert_eq!(
            SkipReason::PersistenceFailed("locked".into()).to_string(),
            "write-back failed: locked"
        );
    }

    #[test]
    fn test_reason_json_shape() {
        let json = serde_json::to_value(SkipReason::TraversalFailed("boom".into())).unwrap();
        assert_eq!(json["kind"], "traversal_failed");
        assert_eq!(json["cause"], "boom");

        let json = serde_json::to_value(SkipReason::SingerNotFound).unwrap();
        assert_eq!(json["kind"], "singer_not_found");
    }
}
