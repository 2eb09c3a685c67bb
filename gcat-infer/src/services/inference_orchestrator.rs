//! Inference Orchestrator
//!
//! Batch job that recomputes every singer's inferred genre:
//! 1. List singers in id order
//! 2. Traverse each singer's playlists
//! 3. Tally playlist genres and pick the dominant one
//! 4. Write it back, or record why not
//!
//! Singers are processed one at a time. A failure for one singer is
//! recorded in the report and the batch moves on; only an unreachable
//! store aborts the run. Each write is independent and recomputed from
//! current state, so an interrupted run can simply be started again.

use std::sync::Arc;

use chrono::Utc;
use gcat_common::db::{GenreId, Playlist, SingerId};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use super::genre_tally::GenreTally;
use super::playlist_traversal::PlaylistTraversal;
use crate::error::{Entity, InferenceError, InferenceResult};
use crate::models::{InferenceReport, SkipReason, SkippedSinger};
use crate::store::CatalogStore;

/// Read-only inference result for one singer
#[derive(Debug, Clone, Serialize)]
pub struct SingerInference {
    pub singer_id: SingerId,
    pub playlists: Vec<Playlist>,
    /// (genre id, playlist count), count desc then id asc
    pub ranked: Vec<(GenreId, usize)>,
    pub selected: Option<GenreId>,
}

/// Per-singer result inside a run
enum SingerOutcome {
    Updated(GenreId),
    Skipped(SkipReason),
}

pub struct InferenceOrchestrator<S: CatalogStore + ?Sized> {
    store: Arc<S>,
    /// Held for the duration of a run; overlapping runs are refused
    run_guard: Mutex<()>,
}

impl<S: CatalogStore + ?Sized> InferenceOrchestrator<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            run_guard: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Recompute and persist the inferred genre of every singer
    ///
    /// # Errors
    /// - `AlreadyRunning` if another run on this orchestrator is in flight
    /// - `StoreUnavailable` if the store cannot be reached; singers already
    ///   written keep their new value
    pub async fn run_inference(&self) -> InferenceResult<InferenceReport> {
        let _guard = self
            .run_guard
            .try_lock()
            .map_err(|_| InferenceError::AlreadyRunning)?;

        let started_at = Utc::now();

        let singers = self.store.list_singers().await.map_err(|e| {
            error!("Cannot list singers, aborting inference run: {}", e);
            match e {
                fatal @ InferenceError::StoreUnavailable(_) => fatal,
                other => InferenceError::StoreUnavailable(other.to_string()),
            }
        })?;

        info!(singers = singers.len(), "Starting genre inference run");

        let mut updated = 0;
        let mut skipped = Vec::new();

        for singer in &singers {
            match self.process_singer(singer.id).await? {
                SingerOutcome::Updated(genre_id) => {
                    debug!(singer_id = singer.id, genre_id, "Inferred genre written");
                    updated += 1;
                }
                SingerOutcome::Skipped(reason) => {
                    if reason.is_failure() {
                        warn!(singer_id = singer.id, "Singer skipped: {}", reason);
                    } else {
                        debug!(singer_id = singer.id, "Singer skipped: {}", reason);
                    }
                    skipped.push(SkippedSinger {
                        singer_id: singer.id,
                        reason,
                    });
                }
            }
        }

        let report = InferenceReport {
            started_at,
            finished_at: Utc::now(),
            singers_examined: singers.len(),
            updated,
            skipped,
        };

        info!(
            examined = report.singers_examined,
            updated = report.updated,
            skipped = report.skipped.len(),
            failures = report.failures().count(),
            duration_ms = report.duration_ms(),
            "Genre inference run finished"
        );

        Ok(report)
    }

    /// Traverse, tally and select for one singer without writing
    pub async fn infer_singer(&self, singer_id: SingerId) -> InferenceResult<SingerInference> {
        let playlists = PlaylistTraversal::new(self.store.as_ref())
            .playlists_for_singer(singer_id)
            .await?;

        let tally = GenreTally::from_playlists(&playlists);

        Ok(SingerInference {
            singer_id,
            ranked: tally.ranked(),
            selected: tally.dominant(),
            playlists,
        })
    }

    /// One singer's step of a run
    ///
    /// Returns `Err` only for conditions that must abort the whole batch.
    async fn process_singer(&self, singer_id: SingerId) -> InferenceResult<SingerOutcome> {
        let inference = match self.infer_singer(singer_id).await {
            Ok(inference) => inference,
            Err(e) => return Self::skip_or_abort(e, SkipReason::TraversalFailed),
        };

        let Some(genre_id) = inference.selected else {
            // Leave any earlier inferred genre in place
            return Ok(SingerOutcome::Skipped(SkipReason::NoGenreTaggedPlaylists));
        };

        match self
            .store
            .update_singer_inferred_genre(singer_id, Some(genre_id))
            .await
        {
            Ok(()) => Ok(SingerOutcome::Updated(genre_id)),
            Err(e) => Self::skip_or_abort(e, SkipReason::PersistenceFailed),
        }
    }

    fn skip_or_abort(
        err: InferenceError,
        as_failure: fn(String) -> SkipReason,
    ) -> InferenceResult<SingerOutcome> {
        match err {
            InferenceError::NotFound {
                entity: Entity::Singer,
                ..
            } => Ok(SingerOutcome::Skipped(SkipReason::SingerNotFound)),
            e if e.is_fatal() => {
                error!("Aborting inference run: {}", e);
                Err(e)
            }
            e => Ok(SingerOutcome::Skipped(as_failure(e.to_string()))),
        }
    }
}
