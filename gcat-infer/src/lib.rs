//! gcat-infer library interface
//!
//! Genre inference engine for the music catalog: infers each singer's genre
//! from the genres of the playlists that contain the singer's songs.
//!
//! - [`store`]: entity store contract and its SQLite implementation
//! - [`services`]: playlist traversal, genre tally, inference orchestrator,
//!   recorded batch runs
//! - [`db`]: SQL functions and inference run history

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod store;
pub mod utils;

pub use crate::config::InferenceSettings;
pub use crate::error::{Entity, InferenceError, InferenceResult};
pub use crate::models::{InferenceReport, SkipReason, SkippedSinger};
pub use crate::services::{
    run_batch, select_dominant_genre, GenreTally, InferenceOrchestrator, PlaylistTraversal,
    RecordedRun,
};
pub use crate::store::{CatalogStore, SqliteCatalogStore};
