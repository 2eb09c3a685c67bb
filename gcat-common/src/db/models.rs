//! Database models

use serde::{Deserialize, Serialize};

pub type GenreId = i64;
pub type SingerId = i64;
pub type SongId = i64;
pub type PlaylistId = i64;

/// Named musical category. Names are unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Genre {
    pub id: GenreId,
    pub name: String,
}

/// Performer with a declared genre and an optional inferred genre
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Singer {
    pub id: SingerId,
    pub name: String,
    pub genre_id: GenreId,
    /// Written only by the inference orchestrator
    pub inferred_genre_id: Option<GenreId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Song {
    pub id: SongId,
    pub title: String,
    pub singer_id: SingerId,
    pub genre_id: GenreId,
}

/// Playlists are created untagged; the genre can be assigned later
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Playlist {
    pub id: PlaylistId,
    pub name: String,
    pub genre_id: Option<GenreId>,
}

/// One row of the song/playlist join table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::FromRow)]
pub struct Membership {
    pub song_id: SongId,
    pub playlist_id: PlaylistId,
}
