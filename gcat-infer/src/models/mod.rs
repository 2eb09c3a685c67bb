//! Data models for inference runs

pub mod inference_report;
pub mod inference_run;

pub use inference_report::{InferenceReport, SkipReason, SkippedSinger};
pub use inference_run::{InferenceRun, RunState};
