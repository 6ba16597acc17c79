//! Application configuration loaded from `config.json`.

use std::fs;
use std::path::{Path, PathBuf};

mod app_config;

pub use app_config::{Config, WatcherConfig};

/// Get the configuration file path
pub fn config_path() -> PathBuf {
    const FILENAME: &str = "config.json";
    if let Some(mut path) = dirs::config_dir() {
        path.push("mdview");
        path.push(FILENAME);
        return path;
    }

    // Fallback to home directory
    if let Some(mut path) = dirs::home_dir() {
        path.push(".mdview");
        path.push(FILENAME);
        return path;
    }

    PathBuf::from(FILENAME)
}

impl Config {
    /// Load the configuration from the default location
    pub fn load() -> Self {
        Self::load_from(config_path())
    }

    /// Load the configuration from `path`.
    ///
    /// A missing file yields the defaults. An unreadable or malformed file
    /// also yields the defaults, with a warning.
    pub fn load_from(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Self::default();
        }

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(?e, path = %path.display(), "Failed to read config, using defaults");
                return Self::default();
            }
        };

        match serde_json::from_str(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "Loaded config");
                config
            }
            Err(e) => {
                tracing::warn!(%e, path = %path.display(), "Malformed config, using defaults");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config::load_from(temp_dir.path().join("config.json"));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_valid_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        fs::write(&path, r#"{ "session": { "restoreOnStartup": false } }"#).unwrap();

        let config = Config::load_from(&path);

        assert!(!config.session.restore_on_startup);
        assert!(config.watcher.enabled);
    }

    #[test]
    fn test_load_malformed_file_falls_back() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        fs::write(&path, "{ session: nope").unwrap();

        assert_eq!(Config::load_from(&path), Config::default());
    }

    #[test]
    fn test_config_path_file_name() {
        assert!(config_path().ends_with("config.json"));
    }
}
