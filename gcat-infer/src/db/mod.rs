//! Database access for gcat-infer
//!
//! Thin SQL functions over the shared catalog schema. Referential checks
//! that need typed errors live in [`crate::store`]; the schema's foreign
//! keys back them up.

pub mod genres;
pub mod memberships;
pub mod playlists;
pub mod runs;
pub mod singers;
pub mod songs;

use gcat_common::{Error, Result};
use sqlx::SqlitePool;
use std::path::Path;

/// Open (or create) the catalog database and ensure the schema exists
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    tracing::debug!("Connecting to database: {}", db_path.display());

    let pool = gcat_common::db::init_database(db_path).await?;

    tracing::info!("Catalog tables initialized");

    Ok(pool)
}

/// Trim a required text field, rejecting blank values
pub(crate) fn required_text(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidInput(format!("{} must not be empty", field)));
    }
    Ok(trimmed.to_string())
}
