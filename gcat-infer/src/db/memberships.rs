//! Song/playlist membership operations

use gcat_common::db::{Membership, PlaylistId, SongId};
use gcat_common::Result;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

/// Insert one membership row per song id, all or nothing
///
/// Rows are written in chunks of `batch_size` inside a single transaction.
/// Duplicate ids produce duplicate rows.
pub async fn insert_memberships(
    pool: &SqlitePool,
    playlist_id: PlaylistId,
    song_ids: &[SongId],
    batch_size: usize,
) -> Result<()> {
    if song_ids.is_empty() {
        return Ok(());
    }

    let mut tx = pool.begin().await?;

    for chunk in song_ids.chunks(batch_size.max(1)) {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("INSERT INTO song_playlists (song_id, playlist_id) ");
        builder.push_values(chunk, |mut row, song_id| {
            row.push_bind(*song_id).push_bind(playlist_id);
        });
        builder.build().execute(&mut *tx).await?;
    }

    tx.commit().await?;

    Ok(())
}

/// Membership rows for any of the given songs
///
/// Queried in chunks of `batch_size` so large song sets stay under SQLite's
/// bound-parameter limit. Rows come back in insertion order per chunk.
pub async fn list_memberships_by_song_ids(
    pool: &SqlitePool,
    song_ids: &[SongId],
    batch_size: usize,
) -> Result<Vec<Membership>> {
    let mut memberships = Vec::new();

    for chunk in song_ids.chunks(batch_size.max(1)) {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT song_id, playlist_id FROM song_playlists WHERE song_id IN (");
        let mut ids = builder.separated(", ");
        for song_id in chunk {
            ids.push_bind(*song_id);
        }
        ids.push_unseparated(") ORDER BY id");

        let rows = builder
            .build_query_as::<Membership>()
            .fetch_all(pool)
            .await?;
        memberships.extend(rows);
    }

    Ok(memberships)
}
