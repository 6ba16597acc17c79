use serde::{Deserialize, Serialize};

mod search_config;
mod session_config;
mod watcher_config;

pub use search_config::SearchConfig;
pub use session_config::SessionConfig;
pub use watcher_config::WatcherConfig;

/// Global application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub session: SessionConfig,
    pub search: SearchConfig,
    pub watcher: WatcherConfig,
}
