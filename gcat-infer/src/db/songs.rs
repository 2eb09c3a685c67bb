//! Song database operations

use gcat_common::db::{GenreId, PlaylistId, SingerId, Song, SongId};
use gcat_common::Result;
use sqlx::SqlitePool;

pub async fn create_song(
    pool: &SqlitePool,
    title: &str,
    singer_id: SingerId,
    genre_id: GenreId,
) -> Result<Song> {
    let title = super::required_text("title", title)?;

    let done = sqlx::query("INSERT INTO songs (title, singer_id, genre_id) VALUES (?, ?, ?)")
        .bind(&title)
        .bind(singer_id)
        .bind(genre_id)
        .execute(pool)
        .await?;

    Ok(Song {
        id: done.last_insert_rowid(),
        title,
        singer_id,
        genre_id,
    })
}

pub async fn get_song(pool: &SqlitePool, id: SongId) -> Result<Option<Song>> {
    let song = sqlx::query_as::<_, Song>(
        "SELECT id, title, singer_id, genre_id FROM songs WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(song)
}

pub async fn list_songs(pool: &SqlitePool) -> Result<Vec<Song>> {
    let songs = sqlx::query_as::<_, Song>(
        "SELECT id, title, singer_id, genre_id FROM songs ORDER BY id",
    )
    .fetch_all(pool)
    .await?;

    Ok(songs)
}

pub async fn list_songs_by_singer(pool: &SqlitePool, singer_id: SingerId) -> Result<Vec<Song>> {
    let songs = sqlx::query_as::<_, Song>(
        "SELECT id, title, singer_id, genre_id FROM songs WHERE singer_id = ? ORDER BY id",
    )
    .bind(singer_id)
    .fetch_all(pool)
    .await?;

    Ok(songs)
}

/// Songs in a playlist, one entry per membership row
///
/// A song added twice appears twice, in insertion order.
pub async fn list_songs_in_playlist(pool: &SqlitePool, playlist_id: PlaylistId) -> Result<Vec<Song>> {
    let songs = sqlx::query_as::<_, Song>(
        r#"
        SELECT so.id, so.title, so.singer_id, so.genre_id
        FROM song_playlists sp
        JOIN songs so ON so.id = sp.song_id
        WHERE sp.playlist_id = ?
        ORDER BY sp.id
        "#,
    )
    .bind(playlist_id)
    .fetch_all(pool)
    .await?;

    Ok(songs)
}
