//! Entity store
//!
//! [`CatalogStore`] is the read/write contract the inference engine consumes.
//! [`SqliteCatalogStore`] implements it over the shared SQLite catalog and
//! also carries the creation and listing operations that are the only way
//! entities come into existence.

use async_trait::async_trait;
use gcat_common::db::{
    Genre, GenreId, Membership, Playlist, PlaylistId, Singer, SingerId, Song, SongId,
};
use sqlx::SqlitePool;

use crate::config::InferenceSettings;
use crate::db;
use crate::error::{Entity, InferenceError, InferenceResult};
use crate::utils::retry_on_lock;

/// Store operations used by traversal and the orchestrator
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn get_singer(&self, id: SingerId) -> InferenceResult<Singer>;

    /// All singers, ordered by id
    async fn list_singers(&self) -> InferenceResult<Vec<Singer>>;

    async fn list_songs_by_singer(&self, id: SingerId) -> InferenceResult<Vec<Song>>;

    async fn list_memberships_by_song_ids(
        &self,
        ids: &[SongId],
    ) -> InferenceResult<Vec<Membership>>;

    async fn get_playlist(&self, id: PlaylistId) -> InferenceResult<Playlist>;

    /// Set or clear the derived genre of one singer atomically
    async fn update_singer_inferred_genre(
        &self,
        id: SingerId,
        genre_id: Option<GenreId>,
    ) -> InferenceResult<()>;
}

/// SQLite-backed catalog store
#[derive(Clone)]
pub struct SqliteCatalogStore {
    pool: SqlitePool,
    settings: InferenceSettings,
}

impl SqliteCatalogStore {
    pub fn new(pool: SqlitePool, settings: InferenceSettings) -> Self {
        Self { pool, settings }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn settings(&self) -> &InferenceSettings {
        &self.settings
    }

    // ------------------------------------------------------------------
    // Genres
    // ------------------------------------------------------------------

    /// Create a genre; a duplicate name is a `Conflict`
    pub async fn create_genre(&self, name: &str) -> InferenceResult<Genre> {
        let genre = db::genres::create_genre(&self.pool, name).await?;
        tracing::debug!(genre_id = genre.id, name = %genre.name, "Created genre");
        Ok(genre)
    }

    pub async fn get_genre(&self, id: GenreId) -> InferenceResult<Genre> {
        db::genres::get_genre(&self.pool, id)
            .await?
            .ok_or(InferenceError::not_found(Entity::Genre, id))
    }

    pub async fn list_genres(&self) -> InferenceResult<Vec<Genre>> {
        Ok(db::genres::list_genres(&self.pool).await?)
    }

    // ------------------------------------------------------------------
    // Singers
    // ------------------------------------------------------------------

    pub async fn create_singer(&self, name: &str, genre_id: GenreId) -> InferenceResult<Singer> {
        self.get_genre(genre_id).await?;
        let singer = db::singers::create_singer(&self.pool, name, genre_id).await?;
        tracing::debug!(singer_id = singer.id, genre_id, "Created singer");
        Ok(singer)
    }

    /// Administrative update of name and declared genre
    ///
    /// The inferred genre is owned by the orchestrator and is left as is.
    pub async fn update_singer(
        &self,
        id: SingerId,
        name: &str,
        genre_id: GenreId,
    ) -> InferenceResult<Singer> {
        self.get_genre(genre_id).await?;

        let touched = db::singers::update_singer(&self.pool, id, name, genre_id).await?;
        if touched == 0 {
            return Err(InferenceError::not_found(Entity::Singer, id));
        }

        self.get_singer(id).await
    }

    /// Distinct singers with at least one song in the playlist
    pub async fn list_singers_in_playlist(
        &self,
        playlist_id: PlaylistId,
    ) -> InferenceResult<Vec<Singer>> {
        self.get_playlist(playlist_id).await?;
        Ok(db::singers::list_singers_in_playlist(&self.pool, playlist_id).await?)
    }

    // ------------------------------------------------------------------
    // Songs
    // ------------------------------------------------------------------

    pub async fn create_song(
        &self,
        title: &str,
        singer_id: SingerId,
        genre_id: GenreId,
    ) -> InferenceResult<Song> {
        self.get_singer(singer_id).await?;
        self.get_genre(genre_id).await?;
        let song = db::songs::create_song(&self.pool, title, singer_id, genre_id).await?;
        tracing::debug!(song_id = song.id, singer_id, genre_id, "Created song");
        Ok(song)
    }

    pub async fn get_song(&self, id: SongId) -> InferenceResult<Song> {
        db::songs::get_song(&self.pool, id)
            .await?
            .ok_or(InferenceError::not_found(Entity::Song, id))
    }

    pub async fn list_songs(&self) -> InferenceResult<Vec<Song>> {
        Ok(db::songs::list_songs(&self.pool).await?)
    }

    /// Playlists the song appears in, ordered by id
    pub async fn list_playlists_for_song(&self, song_id: SongId) -> InferenceResult<Vec<Playlist>> {
        self.get_song(song_id).await?;
        Ok(db::playlists::list_playlists_for_song(&self.pool, song_id).await?)
    }

    /// Songs in a playlist, one per membership row
    pub async fn list_songs_in_playlist(
        &self,
        playlist_id: PlaylistId,
    ) -> InferenceResult<Vec<Song>> {
        self.get_playlist(playlist_id).await?;
        Ok(db::songs::list_songs_in_playlist(&self.pool, playlist_id).await?)
    }

    // ------------------------------------------------------------------
    // Playlists
    // ------------------------------------------------------------------

    /// Create an untagged playlist
    pub async fn create_playlist(&self, name: &str) -> InferenceResult<Playlist> {
        let playlist = db::playlists::create_playlist(&self.pool, name).await?;
        tracing::debug!(playlist_id = playlist.id, "Created playlist");
        Ok(playlist)
    }

    pub async fn list_playlists(&self) -> InferenceResult<Vec<Playlist>> {
        Ok(db::playlists::list_playlists(&self.pool).await?)
    }

    /// Tag a playlist with a genre, or clear the tag with `None`
    pub async fn set_playlist_genre(
        &self,
        id: PlaylistId,
        genre_id: Option<GenreId>,
    ) -> InferenceResult<Playlist> {
        if let Some(genre_id) = genre_id {
            self.get_genre(genre_id).await?;
        }

        let touched = db::playlists::set_playlist_genre(&self.pool, id, genre_id).await?;
        if touched == 0 {
            return Err(InferenceError::not_found(Entity::Playlist, id));
        }

        self.get_playlist(id).await
    }

    /// Add songs to a playlist in one transaction
    ///
    /// The playlist and every song are verified first; if any is missing
    /// nothing is inserted. Returns the added songs in request order.
    pub async fn add_songs_to_playlist(
        &self,
        playlist_id: PlaylistId,
        song_ids: &[SongId],
    ) -> InferenceResult<Vec<Song>> {
        self.get_playlist(playlist_id).await?;

        let mut songs = Vec::with_capacity(song_ids.len());
        for song_id in song_ids {
            songs.push(self.get_song(*song_id).await?);
        }

        db::memberships::insert_memberships(
            &self.pool,
            playlist_id,
            song_ids,
            self.settings.membership_batch_size,
        )
        .await
        .map_err(|e| InferenceError::Persistence(e.to_string()))?;

        tracing::debug!(playlist_id, added = songs.len(), "Added songs to playlist");

        Ok(songs)
    }
}

#[async_trait]
impl CatalogStore for SqliteCatalogStore {
    async fn get_singer(&self, id: SingerId) -> InferenceResult<Singer> {
        db::singers::get_singer(&self.pool, id)
            .await?
            .ok_or(InferenceError::not_found(Entity::Singer, id))
    }

    async fn list_singers(&self) -> InferenceResult<Vec<Singer>> {
        Ok(db::singers::list_singers(&self.pool).await?)
    }

    async fn list_songs_by_singer(&self, id: SingerId) -> InferenceResult<Vec<Song>> {
        Ok(db::songs::list_songs_by_singer(&self.pool, id).await?)
    }

    async fn list_memberships_by_song_ids(
        &self,
        ids: &[SongId],
    ) -> InferenceResult<Vec<Membership>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        Ok(db::memberships::list_memberships_by_song_ids(
            &self.pool,
            ids,
            self.settings.membership_batch_size,
        )
        .await?)
    }

    async fn get_playlist(&self, id: PlaylistId) -> InferenceResult<Playlist> {
        db::playlists::get_playlist(&self.pool, id)
            .await?
            .ok_or(InferenceError::not_found(Entity::Playlist, id))
    }

    async fn update_singer_inferred_genre(
        &self,
        id: SingerId,
        genre_id: Option<GenreId>,
    ) -> InferenceResult<()> {
        if let Some(genre_id) = genre_id {
            self.get_genre(genre_id).await?;
        }

        let pool = &self.pool;
        let touched = retry_on_lock(
            "update_singer_inferred_genre",
            self.settings.max_lock_wait_ms,
            || db::singers::set_inferred_genre(pool, id, genre_id),
        )
        .await
        .map_err(|e| match InferenceError::from(e) {
            fatal @ InferenceError::StoreUnavailable(_) => fatal,
            other => InferenceError::Persistence(other.to_string()),
        })?;

        if touched == 0 {
            return Err(InferenceError::not_found(Entity::Singer, id));
        }

        Ok(())
    }
}
