//! Error types for gcat-infer
//!
//! Per-singer errors (`NotFound`, `Persistence`, traversal failures) are
//! recorded in the run report and never abort a batch. Only
//! `StoreUnavailable` and `AlreadyRunning` end a run early.

use std::fmt;
use thiserror::Error;

/// Catalog entity kinds, used to qualify `NotFound`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Genre,
    Singer,
    Song,
    Playlist,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Entity::Genre => "Genre",
            Entity::Singer => "Singer",
            Entity::Song => "Song",
            Entity::Playlist => "Playlist",
        };
        f.write_str(name)
    }
}

/// Inference engine error type
#[derive(Debug, Error)]
pub enum InferenceError {
    /// Referenced entity absent
    #[error("{entity} with ID {id} not found")]
    NotFound { entity: Entity, id: i64 },

    /// Malformed or missing fields on entity creation
    #[error("Validation failure: {0}")]
    Validation(String),

    /// Duplicate value on a unique column
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Write failed in the store
    #[error("Persistence failure: {0}")]
    Persistence(String),

    /// The store itself cannot be reached; no progress is possible
    #[error("Entity store unavailable: {0}")]
    StoreUnavailable(String),

    /// Another inference run holds the guard
    #[error("An inference run is already in progress")]
    AlreadyRunning,

    /// Any other catalog error
    #[error(transparent)]
    Common(gcat_common::Error),
}

impl InferenceError {
    pub fn not_found(entity: Entity, id: i64) -> Self {
        InferenceError::NotFound { entity, id }
    }

    /// True for conditions that must abort a whole batch
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            InferenceError::StoreUnavailable(_) | InferenceError::AlreadyRunning
        )
    }
}

impl From<gcat_common::Error> for InferenceError {
    fn from(err: gcat_common::Error) -> Self {
        use gcat_common::Error;

        match err {
            Error::Database(db_err) if is_connectivity_error(&db_err) => {
                InferenceError::StoreUnavailable(db_err.to_string())
            }
            Error::InvalidInput(msg) => InferenceError::Validation(msg),
            Error::Conflict(msg) => InferenceError::Conflict(msg),
            other => InferenceError::Common(other),
        }
    }
}

impl From<sqlx::Error> for InferenceError {
    fn from(err: sqlx::Error) -> Self {
        gcat_common::Error::Database(err).into()
    }
}

/// Pool or connection level failures, as opposed to statement failures
fn is_connectivity_error(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::PoolClosed
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::WorkerCrashed
    )
}

/// Result type for inference operations
pub type InferenceResult<T> = Result<T, InferenceError>;
