use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunables for the session engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Inactivity delay before the note and record writers commit
    /// Default: 1500 ms
    pub autosave_delay_ms: u64,

    /// How long the record writer's status message stays visible
    /// Default: 2500 ms
    pub status_clear_ms: u64,

    /// Lifetime number of successful summary generations allowed
    pub free_summary_limit: u32,
}

impl SessionSettings {
    pub fn autosave_delay(&self) -> Duration {
        Duration::from_millis(self.autosave_delay_ms)
    }

    pub fn status_clear_delay(&self) -> Duration {
        Duration::from_millis(self.status_clear_ms)
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            autosave_delay_ms: 1500,
            status_clear_ms: 2500,
            free_summary_limit: 3,
        }
    }
}
