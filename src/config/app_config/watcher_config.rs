use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default debounce delay for file change events
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;

/// Smallest accepted debounce delay
pub const MIN_DEBOUNCE_MS: u64 = 50;

fn default_enabled() -> bool {
    true
}

fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE_MS
}

/// Configuration for reloading documents when their file changes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatcherConfig {
    /// Reload open documents when they change on disk
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Debounce delay in milliseconds
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl WatcherConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms.max(MIN_DEBOUNCE_MS))
    }
}
