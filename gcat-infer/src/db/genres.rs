//! Genre database operations

use gcat_common::db::{Genre, GenreId};
use gcat_common::{Error, Result};
use sqlx::SqlitePool;

/// Insert a genre; a duplicate name fails with `Conflict` and inserts nothing
pub async fn create_genre(pool: &SqlitePool, name: &str) -> Result<Genre> {
    let name = super::required_text("name", name)?;

    let result = sqlx::query("INSERT INTO genres (name) VALUES (?)")
        .bind(&name)
        .execute(pool)
        .await;

    match result {
        Ok(done) => Ok(Genre {
            id: done.last_insert_rowid(),
            name,
        }),
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => Err(
            Error::Conflict(format!("Genre with name '{}' already exists", name)),
        ),
        Err(e) => Err(e.into()),
    }
}

pub async fn get_genre(pool: &SqlitePool, id: GenreId) -> Result<Option<Genre>> {
    let genre = sqlx::query_as::<_, Genre>("SELECT id, name FROM genres WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(genre)
}

pub async fn list_genres(pool: &SqlitePool) -> Result<Vec<Genre>> {
    let genres = sqlx::query_as::<_, Genre>("SELECT id, name FROM genres ORDER BY id")
        .fetch_all(pool)
        .await?;

    Ok(genres)
}
