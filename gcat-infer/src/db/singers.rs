//! Singer database operations

use gcat_common::db::{GenreId, PlaylistId, Singer, SingerId};
use gcat_common::Result;
use sqlx::SqlitePool;

const SINGER_COLUMNS: &str = "id, name, genre_id, inferred_genre_id";

/// Insert a singer with no inferred genre
pub async fn create_singer(pool: &SqlitePool, name: &str, genre_id: GenreId) -> Result<Singer> {
    let name = super::required_text("name", name)?;

    let done = sqlx::query("INSERT INTO singers (name, genre_id, inferred_genre_id) VALUES (?, ?, NULL)")
        .bind(&name)
        .bind(genre_id)
        .execute(pool)
        .await?;

    Ok(Singer {
        id: done.last_insert_rowid(),
        name,
        genre_id,
        inferred_genre_id: None,
    })
}

pub async fn get_singer(pool: &SqlitePool, id: SingerId) -> Result<Option<Singer>> {
    let singer = sqlx::query_as::<_, Singer>(&format!(
        "SELECT {} FROM singers WHERE id = ?",
        SINGER_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(singer)
}

/// All singers in stable id order
pub async fn list_singers(pool: &SqlitePool) -> Result<Vec<Singer>> {
    let singers = sqlx::query_as::<_, Singer>(&format!(
        "SELECT {} FROM singers ORDER BY id",
        SINGER_COLUMNS
    ))
    .fetch_all(pool)
    .await?;

    Ok(singers)
}

/// Administrative update of the declared fields
///
/// Returns the number of rows touched (0 when the singer is absent).
/// `inferred_genre_id` is not part of this statement.
pub async fn update_singer(
    pool: &SqlitePool,
    id: SingerId,
    name: &str,
    genre_id: GenreId,
) -> Result<u64> {
    let name = super::required_text("name", name)?;

    let done = sqlx::query(
        r#"
        UPDATE singers
        SET name = ?, genre_id = ?, updated_at = CURRENT_TIMESTAMP
        WHERE id = ?
        "#,
    )
    .bind(&name)
    .bind(genre_id)
    .bind(id)
    .execute(pool)
    .await?;

    Ok(done.rows_affected())
}

/// Write the derived genre of one singer
///
/// A single UPDATE of one column, so readers see either the old or the new
/// value. Returns the number of rows touched.
pub async fn set_inferred_genre(
    pool: &SqlitePool,
    id: SingerId,
    genre_id: Option<GenreId>,
) -> Result<u64> {
    let done = sqlx::query(
        r#"
        UPDATE singers
        SET inferred_genre_id = ?, updated_at = CURRENT_TIMESTAMP
        WHERE id = ?
        "#,
    )
    .bind(genre_id)
    .bind(id)
    .execute(pool)
    .await?;

    Ok(done.rows_affected())
}

/// Distinct singers with at least one song in the playlist
pub async fn list_singers_in_playlist(
    pool: &SqlitePool,
    playlist_id: PlaylistId,
) -> Result<Vec<Singer>> {
    let singers = sqlx::query_as::<_, Singer>(
        r#"
        SELECT DISTINCT s.id, s.name, s.genre_id, s.inferred_genre_id
        FROM singers s
        JOIN songs so ON so.singer_id = s.id
        JOIN song_playlists sp ON sp.song_id = so.id
        WHERE sp.playlist_id = ?
        ORDER BY s.id
        "#,
    )
    .bind(playlist_id)
    .fetch_all(pool)
    .await?;

    Ok(singers)
}
