//! Lock-contention retry for catalog writes
//!
//! CRUD writers share the SQLite file with a running batch. A write that
//! loses the lock race is retried with doubling sleeps until the configured
//! wait budget is spent, then surfaces as [`Error::LockTimeout`].

use gcat_common::{Error, Result};
use std::future::Future;
use std::time::{Duration, Instant};

/// First sleep after a locked attempt
const FIRST_BACKOFF: Duration = Duration::from_millis(10);

/// Longest single sleep
const BACKOFF_CEILING: Duration = Duration::from_millis(1000);

/// Run `write` until it succeeds, fails with a non-lock error, or
/// `max_wait_ms` has elapsed since the first attempt.
///
/// Sleeps never overshoot the budget: the last sleep is clipped so the
/// final attempt lands at the deadline.
pub async fn retry_on_lock<F, Fut, T>(operation: &str, max_wait_ms: u64, mut write: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let started = Instant::now();
    let deadline = started + Duration::from_millis(max_wait_ms);
    let mut backoff = FIRST_BACKOFF;
    let mut attempts: u32 = 0;

    loop {
        attempts += 1;

        let err = match write().await {
            Ok(value) => {
                if attempts > 1 {
                    tracing::debug!(operation, attempts, "Write went through after lock contention");
                }
                return Ok(value);
            }
            Err(err) if err.is_database_locked() => err,
            Err(err) => return Err(err),
        };

        let now = Instant::now();
        if now >= deadline {
            let elapsed_ms = now.duration_since(started).as_millis() as u64;
            tracing::error!(operation, attempts, elapsed_ms, max_wait_ms, "Giving up on locked write: {}", err);
            return Err(Error::LockTimeout {
                operation: operation.to_string(),
                attempts,
                elapsed_ms,
                max_wait_ms,
            });
        }

        let sleep = backoff.min(deadline - now);
        tracing::warn!(
            operation,
            attempts,
            sleep_ms = sleep.as_millis() as u64,
            "Database locked, backing off"
        );
        tokio::time::sleep(sleep).await;
        backoff = (backoff * 2).min(BACKOFF_CEILING);
    }
}
