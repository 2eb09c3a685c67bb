//! Runtime settings for the inference engine
//!
//! Resolved from the TOML config file with compiled defaults as fallback.
//! Command-line overrides are applied by the binary on top of this.

use gcat_common::config::{CompiledDefaults, TomlConfig};
use tracing::warn;

/// Settings consumed by the entity store and the orchestrator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferenceSettings {
    /// Upper bound on retrying a write that hits `database is locked`
    pub max_lock_wait_ms: u64,
    /// Rows per statement for membership inserts and `IN (...)` lookups
    pub membership_batch_size: usize,
}

impl Default for InferenceSettings {
    fn default() -> Self {
        let defaults = CompiledDefaults::for_current_platform();
        Self {
            max_lock_wait_ms: defaults.max_lock_wait_ms,
            membership_batch_size: defaults.membership_batch_size,
        }
    }
}

impl InferenceSettings {
    /// Merge the `[inference]` table of a config file over the defaults
    pub fn from_toml(toml: Option<&TomlConfig>) -> Self {
        let mut settings = Self::default();

        let Some(inference) = toml.map(|c| &c.inference) else {
            return settings;
        };

        if let Some(wait) = inference.max_lock_wait_ms {
            settings.max_lock_wait_ms = wait;
        }

        match inference.membership_batch_size {
            // Zero would make chunking loop forever
            Some(0) => warn!(
                "membership_batch_size = 0 is invalid, using {}",
                settings.membership_batch_size
            ),
            // SQLite caps bound parameters at 32766; inserts bind two per row
            Some(size) => settings.membership_batch_size = size.min(MAX_BATCH_SIZE),
            None => {}
        }

        settings
    }
}

/// Largest batch that keeps two-column inserts under SQLite's parameter cap
pub const MAX_BATCH_SIZE: usize = 16_000;
