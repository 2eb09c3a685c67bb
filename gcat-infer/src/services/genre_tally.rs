//! Genre tally and dominant genre selection
//!
//! Counts are kept in a `BTreeMap` and the winner is chosen by an explicit
//! ordering, count descending then genre id ascending. The result never
//! depends on iteration order: on a tie the lowest (earliest created)
//! genre id wins.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};

use gcat_common::db::{GenreId, Playlist, PlaylistId};

/// Per-genre playlist counts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenreTally {
    counts: BTreeMap<GenreId, usize>,
}

impl GenreTally {
    /// Tally the genres of a set of playlists
    ///
    /// Each distinct playlist counts once for its genre. Untagged playlists
    /// are left out and count neither for nor against any genre.
    pub fn from_playlists(playlists: &[Playlist]) -> Self {
        let mut seen: BTreeSet<PlaylistId> = BTreeSet::new();
        let mut counts = BTreeMap::new();

        for playlist in playlists {
            if !seen.insert(playlist.id) {
                continue;
            }
            if let Some(genre_id) = playlist.genre_id {
                *counts.entry(genre_id).or_insert(0) += 1;
            }
        }

        Self { counts }
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn count(&self, genre_id: GenreId) -> usize {
        self.counts.get(&genre_id).copied().unwrap_or(0)
    }

    /// All genres ordered by (count desc, id asc)
    pub fn ranked(&self) -> Vec<(GenreId, usize)> {
        let mut ranked: Vec<(GenreId, usize)> =
            self.counts.iter().map(|(id, count)| (*id, *count)).collect();
        ranked.sort_by_key(|(id, count)| (Reverse(*count), *id));
        ranked
    }

    /// Genre with the strictly highest count, lowest id on ties
    pub fn dominant(&self) -> Option<GenreId> {
        self.counts
            .iter()
            .min_by_key(|(id, count)| (Reverse(**count), **id))
            .map(|(id, _)| *id)
    }
}

/// Dominant genre of a set of playlists, `None` if none is tagged
pub fn select_dominant_genre(playlists: &[Playlist]) -> Option<GenreId> {
    GenreTally::from_playlists(playlists).dominant()
}
