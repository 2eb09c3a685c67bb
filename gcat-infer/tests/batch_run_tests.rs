//! Recorded batch runs: history guard, force, exit codes, failure recording

mod helpers;

use std::sync::Arc;

use chrono::Utc;
use gcat_infer::db::runs;
use gcat_infer::models::RunState;
use gcat_infer::services::EXIT_PARTIAL_FAILURE;
use gcat_infer::{run_batch, CatalogStore, InferenceError, InferenceOrchestrator, SkipReason};
use helpers::{memory_store, tagged_playlist, FaultyStore};
use sqlx::SqlitePool;

/// Catalog with three singers whose songs sit in one Pop playlist
async fn pop_catalog() -> (FaultyStore, Vec<i64>, i64) {
    let store = memory_store().await;
    let rock = store.create_genre("Rock").await.unwrap();
    let pop = store.create_genre("Pop").await.unwrap();
    let list = tagged_playlist(&store, "Pop hits", &pop).await;

    let mut singer_ids = Vec::new();
    for name in ["One", "Two", "Three"] {
        let singer = store.create_singer(name, rock.id).await.unwrap();
        let song = store.create_song(name, singer.id, rock.id).await.unwrap();
        store.add_songs_to_playlist(list.id, &[song.id]).await.unwrap();
        singer_ids.push(singer.id);
    }

    (FaultyStore::new(store), singer_ids, pop.id)
}

async fn states(pool: &SqlitePool) -> Vec<RunState> {
    runs::list_recent_runs(pool, 10)
        .await
        .unwrap()
        .into_iter()
        .map(|run| run.state)
        .collect()
}

#[tokio::test]
async fn test_clean_run_exits_zero() {
    let (store, singer_ids, pop_id) = pop_catalog().await;
    let pool = store.inner.pool().clone();
    let orchestrator = InferenceOrchestrator::new(Arc::new(store));

    let run = run_batch(&pool, &orchestrator, false, 500).await.unwrap();

    assert_eq!(run.exit_code(), 0);
    assert_eq!(run.abandoned, 0);
    assert_eq!(run.report.updated, 3);
    assert_eq!(states(&pool).await, vec![RunState::Completed]);
    for id in singer_ids {
        let singer = orchestrator.store().get_singer(id).await.unwrap();
        assert_eq!(singer.inferred_genre_id, Some(pop_id));
    }
}

#[tokio::test]
async fn test_refuses_while_another_run_is_recorded() {
    let (store, singer_ids, _) = pop_catalog().await;
    let pool = store.inner.pool().clone();
    let orchestrator = InferenceOrchestrator::new(Arc::new(store));
    runs::claim_run(&pool, Utc::now()).await.unwrap().unwrap();

    let err = run_batch(&pool, &orchestrator, false, 500).await.unwrap_err();

    assert!(matches!(err, InferenceError::AlreadyRunning));
    assert_eq!(states(&pool).await, vec![RunState::Running]);
    let singer = orchestrator.store().get_singer(singer_ids[0]).await.unwrap();
    assert_eq!(singer.inferred_genre_id, None);
}

#[tokio::test]
async fn test_force_abandons_stale_run_then_runs() {
    let (store, _, _) = pop_catalog().await;
    let pool = store.inner.pool().clone();
    let orchestrator = InferenceOrchestrator::new(Arc::new(store));
    let stale = runs::claim_run(&pool, Utc::now()).await.unwrap().unwrap();

    let run = run_batch(&pool, &orchestrator, true, 500).await.unwrap();

    assert_eq!(run.abandoned, 1);
    assert_ne!(run.run_id, stale);
    assert_eq!(run.report.updated, 3);
    // Newest first
    assert_eq!(
        states(&pool).await,
        vec![RunState::Completed, RunState::Abandoned]
    );
}

#[tokio::test]
async fn test_partial_failure_exit_code() {
    let (mut store, singer_ids, _) = pop_catalog().await;
    store.failing_writes.insert(singer_ids[1]);
    let pool = store.inner.pool().clone();
    let orchestrator = InferenceOrchestrator::new(Arc::new(store));

    let run = run_batch(&pool, &orchestrator, false, 500).await.unwrap();

    assert_eq!(run.exit_code(), EXIT_PARTIAL_FAILURE);
    assert_eq!(run.report.updated, 2);

    let history = runs::list_recent_runs(&pool, 1).await.unwrap();
    assert_eq!(history[0].state, RunState::Completed);
    assert_eq!(history[0].skipped.len(), 1);
    assert!(matches!(
        history[0].skipped[0].reason,
        SkipReason::PersistenceFailed(_)
    ));
}

#[tokio::test]
async fn test_skips_without_failures_exit_zero() {
    let store = memory_store().await;
    let rock = store.create_genre("Rock").await.unwrap();
    store.create_singer("No songs", rock.id).await.unwrap();
    let pool = store.pool().clone();
    let orchestrator = InferenceOrchestrator::new(Arc::new(store));

    let run = run_batch(&pool, &orchestrator, false, 500).await.unwrap();

    assert_eq!(run.report.skipped.len(), 1);
    assert_eq!(run.exit_code(), 0);
}

#[tokio::test]
async fn test_fatal_run_recorded_as_failed() {
    let (mut store, _, _) = pop_catalog().await;
    store.offline = true;
    let pool = store.inner.pool().clone();
    let orchestrator = InferenceOrchestrator::new(Arc::new(store));

    let err = run_batch(&pool, &orchestrator, false, 500).await.unwrap_err();

    assert!(matches!(err, InferenceError::StoreUnavailable(_)));
    let history = runs::list_recent_runs(&pool, 1).await.unwrap();
    assert_eq!(history[0].state, RunState::Failed);
    assert!(history[0]
        .error
        .as_deref()
        .unwrap()
        .contains("unable to open database file"));
    assert!(!runs::has_running_run(&pool).await.unwrap());
}

#[tokio::test]
async fn test_unrecorded_report_releases_slot() {
    let (store, _, _) = pop_catalog().await;
    let pool = store.inner.pool().clone();
    let orchestrator = InferenceOrchestrator::new(Arc::new(store));

    // Every COMPLETED write looks like lock contention that never clears
    sqlx::query(
        r#"
        CREATE TRIGGER completion_locked
        BEFORE UPDATE OF state ON inference_runs
        WHEN NEW.state = 'COMPLETED'
        BEGIN
            SELECT RAISE(ABORT, 'database is locked');
        END
        "#,
    )
    .execute(&pool)
    .await
    .unwrap();

    let err = run_batch(&pool, &orchestrator, false, 50).await.unwrap_err();

    assert!(matches!(err, InferenceError::Persistence(_)));
    let history = runs::list_recent_runs(&pool, 1).await.unwrap();
    assert_eq!(history[0].state, RunState::Failed);
    assert!(history[0]
        .error
        .as_deref()
        .unwrap()
        .contains("report not recorded"));

    // Next scheduled run is not wedged
    sqlx::query("DROP TRIGGER completion_locked")
        .execute(&pool)
        .await
        .unwrap();
    let run = run_batch(&pool, &orchestrator, false, 50).await.unwrap();
    assert_eq!(run.report.updated, 3);
}
