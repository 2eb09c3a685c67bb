//! Shared fixtures for gcat-infer integration tests

#![allow(dead_code)]

use std::collections::HashSet;

use async_trait::async_trait;
use gcat_common::db::{
    init_memory_database, Genre, GenreId, Membership, Playlist, PlaylistId, Singer, SingerId,
    Song, SongId,
};
use gcat_infer::{
    CatalogStore, Entity, InferenceError, InferenceResult, InferenceSettings, SqliteCatalogStore,
};

/// Fresh store over a private in-memory database
pub async fn memory_store() -> SqliteCatalogStore {
    let pool = init_memory_database()
        .await
        .expect("Failed to create in-memory database");
    SqliteCatalogStore::new(pool, InferenceSettings::default())
}

/// Create a playlist and tag it in one step
pub async fn tagged_playlist(
    store: &SqliteCatalogStore,
    name: &str,
    genre: &Genre,
) -> Playlist {
    let playlist = store.create_playlist(name).await.expect("create playlist");
    store
        .set_playlist_genre(playlist.id, Some(genre.id))
        .await
        .expect("tag playlist")
}

/// Store wrapper that injects failures for chosen singers
///
/// - `failing_writes`: write-back returns a persistence failure
/// - `vanished`: singer lookups return NotFound, as if deleted mid-run
/// - `broken_traversal`: song listing fails with a non-fatal error
/// - `offline`: listing singers reports the store unreachable
pub struct FaultyStore {
    pub inner: SqliteCatalogStore,
    pub failing_writes: HashSet<SingerId>,
    pub vanished: HashSet<SingerId>,
    pub broken_traversal: HashSet<SingerId>,
    pub offline: bool,
}

impl FaultyStore {
    pub fn new(inner: SqliteCatalogStore) -> Self {
        Self {
            inner,
            failing_writes: HashSet::new(),
            vanished: HashSet::new(),
            broken_traversal: HashSet::new(),
            offline: false,
        }
    }
}

#[async_trait]
impl CatalogStore for FaultyStore {
    async fn get_singer(&self, id: SingerId) -> InferenceResult<Singer> {
        if self.vanished.contains(&id) {
            return Err(InferenceError::not_found(Entity::Singer, id));
        }
        self.inner.get_singer(id).await
    }

    async fn list_singers(&self) -> InferenceResult<Vec<Singer>> {
        if self.offline {
            return Err(InferenceError::StoreUnavailable(
                "unable to open database file".to_string(),
            ));
        }
        self.inner.list_singers().await
    }

    async fn list_songs_by_singer(&self, id: SingerId) -> InferenceResult<Vec<Song>> {
        if self.broken_traversal.contains(&id) {
            return Err(InferenceError::Common(gcat_common::Error::Internal(
                "corrupt song index".to_string(),
            )));
        }
        self.inner.list_songs_by_singer(id).await
    }

    async fn list_memberships_by_song_ids(
        &self,
        ids: &[SongId],
    ) -> InferenceResult<Vec<Membership>> {
        self.inner.list_memberships_by_song_ids(ids).await
    }

    async fn get_playlist(&self, id: PlaylistId) -> InferenceResult<Playlist> {
        self.inner.get_playlist(id).await
    }

    async fn update_singer_inferred_genre(
        &self,
        id: SingerId,
        genre_id: Option<GenreId>,
    ) -> InferenceResult<()> {
        if self.failing_writes.contains(&id) {
            return Err(InferenceError::Persistence("disk I/O error".to_string()));
        }
        self.inner.update_singer_inferred_genre(id, genre_id).await
    }
}
