//! Inference run history
//!
//! Each CLI-triggered batch records a row so that a second scheduler
//! instance can see that a run is already in flight.

use chrono::{DateTime, Utc};
use gcat_common::{Error, Result};
use sqlx::{Row, SqlitePool};

use crate::models::{InferenceReport, InferenceRun, RunState, SkippedSinger};

/// Claim the single RUNNING slot and return the new run id
///
/// The existence check and the insert are one statement, so two processes
/// racing for the slot cannot both win. Returns `None` when another run
/// already holds it.
pub async fn claim_run(pool: &SqlitePool, started_at: DateTime<Utc>) -> Result<Option<i64>> {
    let result = sqlx::query(
        r#"
        INSERT INTO inference_runs (state, started_at)
        SELECT ?1, ?2
        WHERE NOT EXISTS (SELECT 1 FROM inference_runs WHERE state = ?1)
        "#,
    )
    .bind(RunState::Running.as_str())
    .bind(started_at.to_rfc3339())
    .execute(pool)
    .await;

    match result {
        Ok(done) if done.rows_affected() == 1 => Ok(Some(done.last_insert_rowid())),
        Ok(_) => Ok(None),
        // Partial unique index backstop
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Store the report of a finished run
pub async fn complete_run(pool: &SqlitePool, run_id: i64, report: &InferenceReport) -> Result<()> {
    let skipped = serde_json::to_string(&report.skipped)
        .map_err(|e| Error::Internal(format!("Failed to serialize skipped singers: {}", e)))?;

    sqlx::query(
        r#"
        UPDATE inference_runs
        SET state = ?, finished_at = ?, singers_examined = ?, updated = ?, skipped = ?
        WHERE id = ?
        "#,
    )
    .bind(RunState::Completed.as_str())
    .bind(report.finished_at.to_rfc3339())
    .bind(report.singers_examined as i64)
    .bind(report.updated as i64)
    .bind(skipped)
    .bind(run_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Mark a run that aborted with a fatal error
pub async fn fail_run(pool: &SqlitePool, run_id: i64, error: &str) -> Result<()> {
    sqlx::query("UPDATE inference_runs SET state = ?, finished_at = ?, error = ? WHERE id = ?")
        .bind(RunState::Failed.as_str())
        .bind(Utc::now().to_rfc3339())
        .bind(error)
        .bind(run_id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Check if any run is currently recorded as RUNNING
pub async fn has_running_run(pool: &SqlitePool) -> Result<bool> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM inference_runs WHERE state = ?")
        .bind(RunState::Running.as_str())
        .fetch_one(pool)
        .await?;

    Ok(count > 0)
}

/// Mark every RUNNING row ABANDONED. Returns how many were cleared.
pub async fn abandon_running_runs(pool: &SqlitePool) -> Result<u64> {
    let done = sqlx::query("UPDATE inference_runs SET state = ?, finished_at = ? WHERE state = ?")
        .bind(RunState::Abandoned.as_str())
        .bind(Utc::now().to_rfc3339())
        .bind(RunState::Running.as_str())
        .execute(pool)
        .await?;

    Ok(done.rows_affected())
}

/// Most recent runs first
pub async fn list_recent_runs(pool: &SqlitePool, limit: u32) -> Result<Vec<InferenceRun>> {
    let rows = sqlx::query(
        r#"
        SELECT id, state, started_at, finished_at, singers_examined, updated, skipped, error
        FROM inference_runs
        ORDER BY id DESC
        LIMIT ?
        "#,
    )
    .bind(limit as i64)
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|row| -> Result<InferenceRun> {
            let state: String = row.get("state");
            let state = state.parse::<RunState>().map_err(Error::Internal)?;

            let started_at: String = row.get("started_at");
            let finished_at: Option<String> = row.get("finished_at");

            let skipped: String = row.get("skipped");
            let skipped: Vec<SkippedSinger> = serde_json::from_str(&skipped)
                .map_err(|e| Error::Internal(format!("Failed to deserialize skipped singers: {}", e)))?;

            Ok(InferenceRun {
                id: row.get("id"),
                state,
                started_at: parse_timestamp(&started_at)?,
                finished_at: finished_at.as_deref().map(parse_timestamp).transpose()?,
                singers_examined: row.get::<i64, _>("singers_examined") as usize,
                updated: row.get::<i64, _>("updated") as usize,
                skipped,
                error: row.get("error"),
            })
        })
        .collect()
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Internal(format!("Failed to parse timestamp '{}': {}", value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SkipReason;
    use gcat_common::db::{init_database, init_memory_database};

    fn report(updated: usize, skipped: Vec<SkippedSinger>) -> InferenceReport {
        InferenceReport {
            started_at: Utc::now(),
            finished_at: Utc::now(),
            singers_examined: updated + skipped.len(),
            updated,
            skipped,
        }
    }

    #[tokio::test]
    async fn test_run_lifecycle() {
        let pool = init_memory_database().await.unwrap();

        let run_id = claim_run(&pool, Utc::now()).await.unwrap().unwrap();
        assert!(has_running_run(&pool).await.unwrap());

        let report = report(
            1,
            vec![SkippedSinger {
                singer_id: 2,
                reason: SkipReason::NoGenreTaggedPlaylists,
            }],
        );
        complete_run(&pool, run_id, &report).await.unwrap();

        assert!(!has_running_run(&pool).await.unwrap());
        let runs = list_recent_runs(&pool, 10).await.unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].state, RunState::Completed);
        assert_eq!(runs[0].updated, 1);
        assert_eq!(runs[0].skipped, report.skipped);
    }

    #[tokio::test]
    async fn test_second_claim_refused_until_finished() {
        let pool = init_memory_database().await.unwrap();

        let first = claim_run(&pool, Utc::now()).await.unwrap();
        assert!(first.is_some());
        assert_eq!(claim_run(&pool, Utc::now()).await.unwrap(), None);

        complete_run(&pool, first.unwrap(), &report(0, Vec::new()))
            .await
            .unwrap();

        assert!(claim_run(&pool, Utc::now()).await.unwrap().is_some());
        assert_eq!(list_recent_runs(&pool, 10).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_racing_processes_get_one_claim() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("genre_catalog.db");
        let pool_a = init_database(&path).await.unwrap();
        let pool_b = init_database(&path).await.unwrap();
        let started_at = Utc::now();

        let (a, b) = tokio::join!(claim_run(&pool_a, started_at), claim_run(&pool_b, started_at));
        let (a, b) = (a.unwrap(), b.unwrap());

        assert!(a.is_some() != b.is_some(), "exactly one claim wins: {:?} {:?}", a, b);
        let running: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM inference_runs WHERE state = 'RUNNING'")
                .fetch_one(&pool_a)
                .await
                .unwrap();
        assert_eq!(running, 1);
    }

    #[tokio::test]
    async fn test_abandon_clears_running() {
        let pool = init_memory_database().await.unwrap();
        claim_run(&pool, Utc::now()).await.unwrap();

        assert_eq!(abandon_running_runs(&pool).await.unwrap(), 1);
        assert!(!has_running_run(&pool).await.unwrap());

        let runs = list_recent_runs(&pool, 10).await.unwrap();
        assert_eq!(runs[0].state, RunState::Abandoned);
    }

    #[tokio::test]
    async fn test_failed_run_keeps_error() {
        let pool = init_memory_database().await.unwrap();
        let run_id = claim_run(&pool, Utc::now()).await.unwrap().unwrap();

        fail_run(&pool, run_id, "store unavailable").await.unwrap();

        let runs = list_recent_runs(&pool, 1).await.unwrap();
        assert_eq!(runs[0].state, RunState::Failed);
        assert_eq!(runs[0].error.as_deref(), Some("store unavailable"));
        assert!(!has_running_run(&pool).await.unwrap());
    }
}
