//! Singer to playlist traversal
//!
//! singer → songs → memberships → distinct playlist ids → playlists,
//! expressed as two explicit set lookups against the store instead of a
//! single join, so each hop can be tested on its own.

use std::collections::BTreeSet;

use gcat_common::db::{Playlist, PlaylistId, SingerId, SongId};

use crate::error::{Entity, InferenceError, InferenceResult};
use crate::store::CatalogStore;

/// Read-only traversal over a catalog store
pub struct PlaylistTraversal<'a, S: CatalogStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: CatalogStore + ?Sized> PlaylistTraversal<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Playlists containing at least one song by the singer
    ///
    /// Each playlist appears once, ordered by playlist id, no matter how
    /// many of the singer's songs (or duplicate membership rows) it holds.
    /// A singer with no songs or no memberships yields an empty list.
    ///
    /// # Errors
    /// `NotFound(Singer)` when the singer does not exist.
    pub async fn playlists_for_singer(&self, singer_id: SingerId) -> InferenceResult<Vec<Playlist>> {
        let singer = self.store.get_singer(singer_id).await?;

        let song_ids: Vec<SongId> = self
            .store
            .list_songs_by_singer(singer.id)
            .await?
            .into_iter()
            .map(|song| song.id)
            .collect();

        if song_ids.is_empty() {
            tracing::debug!(singer_id, "Singer has no songs");
            return Ok(Vec::new());
        }

        let playlist_ids = self.distinct_playlist_ids(&song_ids).await?;

        tracing::debug!(
            singer_id,
            songs = song_ids.len(),
            playlists = playlist_ids.len(),
            "Resolved playlists for singer"
        );

        let mut playlists = Vec::with_capacity(playlist_ids.len());
        for playlist_id in playlist_ids {
            match self.store.get_playlist(playlist_id).await {
                Ok(playlist) => playlists.push(playlist),
                // Deleted after the membership read; current state no longer has it
                Err(InferenceError::NotFound {
                    entity: Entity::Playlist,
                    ..
                }) => {
                    tracing::debug!(singer_id, playlist_id, "Playlist vanished during traversal");
                }
                Err(e) => return Err(e),
            }
        }

        Ok(playlists)
    }

    /// Distinct playlist ids referenced by memberships of the given songs
    pub async fn distinct_playlist_ids(
        &self,
        song_ids: &[SongId],
    ) -> InferenceResult<BTreeSet<PlaylistId>> {
        let memberships = self.store.list_memberships_by_song_ids(song_ids).await?;

        Ok(memberships.into_iter().map(|m| m.playlist_id).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InferenceSettings;
    use crate::store::SqliteCatalogStore;
    use gcat_common::db::init_memory_database;

    async fn store() -> SqliteCatalogStore {
        SqliteCatalogStore::new(init_memory_database().await.unwrap(), InferenceSettings::default())
    }

    #[tokio::test]
    async fn test_unknown_singer_is_not_found() {
        let store = store().await;
        let traversal = PlaylistTraversal::new(&store);

        let err = traversal.playlists_for_singer(12).await.unwrap_err();

        assert!(matches!(
            err,
            InferenceError::NotFound { entity: Entity::Singer, id: 12 }
        ));
    }

    #[tokio::test]
    async fn test_singer_without_songs_is_empty() {
        let store = store().await;
        let rock = store.create_genre("Rock").await.unwrap();
        let singer = store.create_singer("Quiet", rock.id).await.unwrap();

        let playlists = PlaylistTraversal::new(&store)
            .playlists_for_singer(singer.id)
            .await
            .unwrap();

        assert!(playlists.is_empty());
    }

    #[tokio::test]
    async fn test_songs_without_memberships_is_empty() {
        let store = store().await;
        let rock = store.create_genre("Rock").await.unwrap();
        let singer = store.create_singer("Unlisted", rock.id).await.unwrap();
        store.create_song("B-side", singer.id, rock.id).await.unwrap();
        store.create_playlist("Elsewhere").await.unwrap();

        let playlists = PlaylistTraversal::new(&store)
            .playlists_for_singer(singer.id)
            .await
            .unwrap();

        assert!(playlists.is_empty());
    }

    #[tokio::test]
    async fn test_playlist_listed_once_for_many_songs() {
        let store = store().await;
        let rock = store.create_genre("Rock").await.unwrap();
        let singer = store.create_singer("Prolific", rock.id).await.unwrap();
        let one = store.create_song("One", singer.id, rock.id).await.unwrap();
        let two = store.create_song("Two", singer.id, rock.id).await.unwrap();
        let playlist = store.create_playlist("Both").await.unwrap();
        store
            .add_songs_to_playlist(playlist.id, &[one.id, two.id, one.id])
            .await
            .unwrap();

        let playlists = PlaylistTraversal::new(&store)
            .playlists_for_singer(singer.id)
            .await
            .unwrap();

        assert_eq!(playlists, vec![playlist]);
    }

    #[tokio::test]
    async fn test_other_singers_playlists_excluded() {
        let store = store().await;
        let rock = store.create_genre("Rock").await.unwrap();
        let mine = store.create_singer("Mine", rock.id).await.unwrap();
        let theirs = store.create_singer("Theirs", rock.id).await.unwrap();
        let my_song = store.create_song("Mine", mine.id, rock.id).await.unwrap();
        let their_song = store.create_song("Theirs", theirs.id, rock.id).await.unwrap();
        let shared = store.create_playlist("Shared").await.unwrap();
        let private = store.create_playlist("Private").await.unwrap();
        store
            .add_songs_to_playlist(shared.id, &[my_song.id, their_song.id])
            .await
            .unwrap();
        store.add_songs_to_playlist(private.id, &[their_song.id]).await.unwrap();

        let playlists = PlaylistTraversal::new(&store)
            .playlists_for_singer(mine.id)
            .await
            .unwrap();

        assert_eq!(playlists, vec![shared]);
    }
}
