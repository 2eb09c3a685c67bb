//! Genre inference services
//!
//! Control flow of a run: the orchestrator lists singers, asks the
//! traversal for each singer's playlists, tallies their genres and writes
//! the dominant one back to the store. The batch runner wraps a run in
//! its history row.

pub mod batch_runner;
pub mod genre_tally;
pub mod inference_orchestrator;
pub mod playlist_traversal;

pub use batch_runner::{run_batch, RecordedRun, EXIT_PARTIAL_FAILURE};
pub use genre_tally::{select_dominant_genre, GenreTally};
pub use inference_orchestrator::{InferenceOrchestrator, SingerInference};
pub use playlist_traversal::PlaylistTraversal;
