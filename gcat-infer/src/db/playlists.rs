//! Playlist database operations

use gcat_common::db::{GenreId, Playlist, PlaylistId, SongId};
use gcat_common::Result;
use sqlx::SqlitePool;

/// Insert an untagged playlist
pub async fn create_playlist(pool: &SqlitePool, name: &str) -> Result<Playlist> {
    let name = super::required_text("name", name)?;

    let done = sqlx::query("INSERT INTO playlists (name, genre_id) VALUES (?, NULL)")
        .bind(&name)
        .execute(pool)
        .await?;

    Ok(Playlist {
        id: done.last_insert_rowid(),
        name,
        genre_id: None,
    })
}

pub async fn get_playlist(pool: &SqlitePool, id: PlaylistId) -> Result<Option<Playlist>> {
    let playlist = sqlx::query_as::<_, Playlist>(
        "SELECT id, name, genre_id FROM playlists WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(playlist)
}

pub async fn list_playlists(pool: &SqlitePool) -> Result<Vec<Playlist>> {
    let playlists = sqlx::query_as::<_, Playlist>(
        "SELECT id, name, genre_id FROM playlists ORDER BY id",
    )
    .fetch_all(pool)
    .await?;

    Ok(playlists)
}

/// Playlists containing the song, each once even if the song was added twice
pub async fn list_playlists_for_song(pool: &SqlitePool, song_id: SongId) -> Result<Vec<Playlist>> {
    let playlists = sqlx::query_as::<_, Playlist>(
        r#"
        SELECT DISTINCT p.id, p.name, p.genre_id
        FROM playlists p
        JOIN song_playlists sp ON sp.playlist_id = p.id
        WHERE sp.song_id = ?
        ORDER BY p.id
        "#,
    )
    .bind(song_id)
    .fetch_all(pool)
    .await?;

    Ok(playlists)
}

/// Tag or untag a playlist. Returns the number of rows touched.
pub async fn set_playlist_genre(
    pool: &SqlitePool,
    id: PlaylistId,
    genre_id: Option<GenreId>,
) -> Result<u64> {
    let done = sqlx::query("UPDATE playlists SET genre_id = ? WHERE id = ?")
        .bind(genre_id)
        .bind(id)
        .execute(pool)
        .await?;

    Ok(done.rows_affected())
}
