use serde::{Deserialize, Serialize};

fn default_restore_on_startup() -> bool {
    true
}

/// Configuration for session restore
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    /// Reopen the tabs of the previous run on startup
    #[serde(default = "default_restore_on_startup")]
    pub restore_on_startup: bool,
}

// Manual Default because bool's default is false, but restore is on by default
impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            restore_on_startup: default_restore_on_startup(),
        }
    }
}
