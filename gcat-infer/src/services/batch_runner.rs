//! Batch Runner
//!
//! One scheduled inference run with its `inference_runs` history row:
//! 1. Optionally mark stale RUNNING rows ABANDONED (`--force`)
//! 2. Claim the RUNNING slot, refusing if another process holds it
//! 3. Run the orchestrator
//! 4. Record COMPLETED with the report, or FAILED with the cause
//!
//! History writes go through [`retry_on_lock`]. If the COMPLETED write still
//! fails, the row is marked FAILED so the slot is released for the next run.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{error, info, warn};

use super::inference_orchestrator::InferenceOrchestrator;
use crate::db::runs;
use crate::error::{InferenceError, InferenceResult};
use crate::models::InferenceReport;
use crate::store::CatalogStore;
use crate::utils::retry_on_lock;

/// Process exit code when the run finished but some singers failed
pub const EXIT_PARTIAL_FAILURE: u8 = 2;

/// A run that finished and was recorded as COMPLETED
#[derive(Debug, Clone)]
pub struct RecordedRun {
    pub run_id: i64,
    /// Stale RUNNING rows cleared by `force` before this run started
    pub abandoned: u64,
    pub report: InferenceReport,
}

impl RecordedRun {
    pub fn exit_code(&self) -> u8 {
        if self.report.is_clean() {
            0
        } else {
            EXIT_PARTIAL_FAILURE
        }
    }
}

/// Run inference once under the cross-process history guard
///
/// # Errors
/// - `AlreadyRunning` if a RUNNING row exists and `force` is false
/// - any fatal orchestrator error, after the row is marked FAILED
/// - `Persistence` if the report could not be recorded
pub async fn run_batch<S: CatalogStore + ?Sized>(
    pool: &SqlitePool,
    orchestrator: &InferenceOrchestrator<S>,
    force: bool,
    max_lock_wait_ms: u64,
) -> InferenceResult<RecordedRun> {
    let abandoned = if force {
        let cleared = retry_on_lock("abandon_running_runs", max_lock_wait_ms, || {
            runs::abandon_running_runs(pool)
        })
        .await?;
        if cleared > 0 {
            warn!("Marked {} stale run(s) as ABANDONED", cleared);
        }
        cleared
    } else {
        0
    };

    let started_at = Utc::now();
    let run_id = retry_on_lock("claim_run", max_lock_wait_ms, || {
        runs::claim_run(pool, started_at)
    })
    .await?
    .ok_or_else(|| {
        warn!("Another inference run is recorded as RUNNING");
        InferenceError::AlreadyRunning
    })?;

    info!(run_id, "Claimed inference run");

    let report = match orchestrator.run_inference().await {
        Ok(report) => report,
        Err(e) => {
            error!(run_id, "Inference run failed: {}", e);
            record_failure(pool, run_id, &e.to_string(), max_lock_wait_ms).await;
            return Err(e);
        }
    };

    let recorded = retry_on_lock("complete_run", max_lock_wait_ms, || {
        runs::complete_run(pool, run_id, &report)
    })
    .await;

    if let Err(e) = recorded {
        error!(run_id, "Could not record run report: {}", e);
        let cause = format!("report not recorded: {}", e);
        record_failure(pool, run_id, &cause, max_lock_wait_ms).await;
        return Err(InferenceError::Persistence(format!(
            "Run {} finished but its report could not be recorded: {}",
            run_id, e
        )));
    }

    Ok(RecordedRun {
        run_id,
        abandoned,
        report,
    })
}

async fn record_failure(pool: &SqlitePool, run_id: i64, cause: &str, max_lock_wait_ms: u64) {
    let marked = retry_on_lock("fail_run", max_lock_wait_ms, || {
        runs::fail_run(pool, run_id, cause)
    })
    .await;

    if let Err(e) = marked {
        error!(run_id, "Run left as RUNNING, clear it with --force: {}", e);
    }
}
