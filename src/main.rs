mod components;
mod config;
mod host;
mod markdown;
mod search;
mod state;
mod store;
mod utils;
mod watcher;

use clap::Parser;
use dioxus::desktop::tao::dpi::LogicalSize;
use dioxus::desktop::{Config as DesktopConfig, WindowBuilder};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::prelude::*;

use crate::config::Config;
use crate::host::PersistenceStore;
use crate::state::SESSION_KEY;
use crate::store::JsonFileStore;

const VERSION: &str = concat!(
    env!("MDVIEW_BUILD_VERSION"),
    " (",
    compile_time::datetime_str!(),
    ")",
);

/// mdview: a tabbed markdown viewer
#[derive(Parser, Debug)]
#[command(
    version = VERSION,
    about,
    long_about = "mdview: a tabbed markdown viewer\n\n\
        Opens local markdown files in tabs, searches inside them and\n\
        restores the open tabs on the next start.",
    after_long_help = "Examples:\n\
        \x20 mdview                       Restore the previous session\n\
        \x20 mdview README.md             Open a file in a new tab\n\
        \x20 mdview --no-restore a.md     Open only a.md\n\
        \x20 mdview --reset-session       Forget the saved tabs"
)]
struct Cli {
    /// Files to open
    #[arg()]
    paths: Vec<PathBuf>,

    /// Do not reopen the tabs of the previous run
    #[arg(long)]
    no_restore: bool,

    /// Remove the saved session before starting
    #[arg(long)]
    reset_session: bool,
}

const DEFAULT_LOGLEVEL: &str = if cfg!(debug_assertions) {
    "debug"
} else {
    "info"
};

fn main() {
    // Parse CLI arguments first (before any other initialization)
    let cli = Cli::parse();

    // Load environment variables from .env file
    if let Ok(dotenv) = dotenvy::dotenv() {
        println!("Loaded .env file from: {}", dotenv.display());
    }
    init_tracing();

    let config = Config::load();
    let store = Arc::new(JsonFileStore::new(JsonFileStore::default_dir()));
    tracing::debug!(dir = %store.dir().display(), "Using state directory");

    if cli.reset_session {
        match store.remove(SESSION_KEY) {
            Ok(()) => tracing::info!("Session reset"),
            Err(e) => tracing::error!(%e, "Failed to reset session"),
        }
    }

    let paths = cli.paths.into_iter().filter_map(resolve_cli_path).collect();
    let restore = config.session.restore_on_startup && !cli.no_restore;

    let options = components::LaunchOptions {
        config,
        store,
        paths,
        restore,
    };

    let desktop_config = DesktopConfig::new().with_window(
        WindowBuilder::new()
            .with_title("mdview")
            .with_inner_size(LogicalSize::new(1000, 800)),
    );

    dioxus::LaunchBuilder::desktop()
        .with_cfg(desktop_config)
        .with_context(options)
        .launch(components::App);
}

/// Make a command-line path absolute, dropping directories and missing files
fn resolve_cli_path(path: PathBuf) -> Option<PathBuf> {
    match std::fs::canonicalize(&path) {
        Ok(resolved) if resolved.is_file() => Some(resolved),
        Ok(resolved) => {
            tracing::warn!(path = %resolved.display(), "Not a file, skipping");
            None
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), %e, "Cannot open path, skipping");
            None
        }
    }
}

fn init_tracing() {
    let silence_filter = tracing_subscriber::filter::filter_fn(|metadata| {
        // Filter out specific error from dioxus_core::properties:136
        // Known issue: https://github.com/DioxusLabs/dioxus/issues/3872
        metadata.target() != "dioxus_core::properties::__component_called_as_function"
    });

    let env_filter_layer =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOGLEVEL));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .pretty()
        .without_time()
        .with_target(false)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .with_filter(silence_filter.clone());

    let registry = tracing_subscriber::registry()
        .with(env_filter_layer)
        .with(fmt_layer);

    // On macOS, also log to Console.app via oslog
    #[cfg(target_os = "macos")]
    let registry = registry.with(
        tracing_oslog::OsLogger::new("dev.mdview.mdview", "default").with_filter(silence_filter),
    );

    registry.init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_cli_flags() {
        let cli = Cli::parse_from(["mdview", "--no-restore", "a.md", "b.md"]);
        assert!(cli.no_restore);
        assert!(!cli.reset_session);
        assert_eq!(cli.paths, vec![PathBuf::from("a.md"), PathBuf::from("b.md")]);
    }

    #[test]
    fn test_resolve_cli_path() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("doc.md");
        std::fs::write(&file, "# Doc").unwrap();

        assert_eq!(resolve_cli_path(file.clone()), Some(file.canonicalize().unwrap()));
        assert_eq!(resolve_cli_path(temp_dir.path().to_path_buf()), None);
        assert_eq!(resolve_cli_path(temp_dir.path().join("missing.md")), None);
    }
}
