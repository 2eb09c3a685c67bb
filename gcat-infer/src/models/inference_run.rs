//! Persisted history of inference runs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::SkippedSinger;

/// Lifecycle of a recorded run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunState {
    Running,
    Completed,
    Failed,
    /// Left RUNNING by a process that never finished; cleared by `--force`
    Abandoned,
}

impl RunState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunState::Running => "RUNNING",
            RunState::Completed => "COMPLETED",
            RunState::Failed => "FAILED",
            RunState::Abandoned => "ABANDONED",
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for RunState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RUNNING" => Ok(RunState::Running),
            "COMPLETED" => Ok(RunState::Completed),
            "FAILED" => Ok(RunState::Failed),
            "ABANDONED" => Ok(RunState::Abandoned),
            other => Err(format!("Unknown run state: {}", other)),
        }
    }
}

/// One row of `inference_runs`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceRun {
    pub id: i64,
    pub state: RunState,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub singers_examined: usize,
    pub updated: usize,
    pub skipped: Vec<SkippedSinger>,
    /// Fatal error message for FAILED runs
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_text_round_trip() {
        for state in [
            RunState::Running,
            RunState::Completed,
            RunState::Failed,
            RunState::Abandoned,
        ] {
            assert_eq!(state.as_str().parse::<RunState>(), Ok(state));
        }
        assert!("PAUSED".parse::<RunState>().is_err());
    }
}
