use serde::{Deserialize, Serialize};

/// Configuration for in-document search
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchConfig {
    /// Initial state of the case-sensitivity toggle
    pub case_sensitive: bool,
}
