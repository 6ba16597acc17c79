use dioxus::html::HasFileData;
use dioxus::prelude::*;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;

use super::content::Content;
use super::run_load;
use super::search_bar::SearchBar;
use super::tab::TabBar;
use crate::config::{Config, WatcherConfig};
use crate::host::{PersistenceStore, TokioFileAccess};
use crate::markdown::MarkdownRenderer;
use crate::search::SearchManager;
use crate::state::{LoadPipeline, PendingLoad, SessionManager, Viewer};
use crate::store::JsonFileStore;
use crate::utils::clipboard::SystemClipboard;
use crate::utils::file::OPENABLE_EXTENSIONS;
use crate::watcher::FileWatcher;

const STYLE: &str = include_str!("style.css");

/// Startup parameters handed from `main` to the root component
#[derive(Clone)]
pub struct LaunchOptions {
    pub config: Config,
    pub store: Arc<JsonFileStore>,
    /// Files given on the command line, opened after restore
    pub paths: Vec<PathBuf>,
    pub restore: bool,
}

fn start_viewer(options: &LaunchOptions) -> (Viewer, Vec<PendingLoad>) {
    let pipeline = LoadPipeline::new(Arc::new(TokioFileAccess), Arc::new(MarkdownRenderer));
    let store: Arc<dyn PersistenceStore> = options.store.clone();

    let (mut session, mut loads) = if options.restore {
        SessionManager::restore(pipeline, store)
    } else {
        (SessionManager::new(pipeline, store), Vec::new())
    };
    for path in &options.paths {
        loads.extend(session.open_path(path.clone()));
    }

    let search = SearchManager::new(options.config.search.case_sensitive);
    (Viewer::new(session, search), loads)
}

#[component]
pub fn App() -> Element {
    let options = use_context::<LaunchOptions>();

    let mut viewer = use_context_provider(|| {
        let (viewer, loads) = start_viewer(&options);
        let viewer = Signal::new(viewer);
        for load in loads {
            run_load(viewer, Some(load));
        }
        viewer
    });
    use_context_provider(|| Rc::new(SystemClipboard::new()));

    use_file_watcher(viewer, &options.config.watcher);

    // Track drag-and-drop hover state
    let mut is_dragging = use_signal(|| false);

    let handle_keydown = move |evt: Event<KeyboardData>| {
        let modifiers = evt.modifiers();
        if !(modifiers.ctrl() || modifiers.meta()) {
            return;
        }
        let Key::Character(key) = evt.key() else {
            return;
        };
        match key.to_lowercase().as_str() {
            "o" => {
                evt.prevent_default();
                spawn(open_file_dialog(viewer));
            }
            "t" => {
                viewer.write().new_document();
            }
            "w" => viewer.write().close_active(),
            "f" => {
                evt.prevent_default();
                viewer.write().show_search();
            }
            "r" => {
                evt.prevent_default();
                let pending = viewer.read().reload_active();
                run_load(viewer, pending);
            }
            digit => {
                if let Ok(position @ 1..=9) = digit.parse::<usize>() {
                    viewer.write().switch_to_position(position);
                }
            }
        }
    };

    let search_visible = viewer.read().search().is_visible();

    rsx! {
        style { "{STYLE}" }
        div {
            class: "app-container",
            class: if is_dragging() { "drag-over" },
            tabindex: "0",
            autofocus: true,
            onkeydown: handle_keydown,
            ondragover: move |evt| {
                evt.prevent_default();
                is_dragging.set(true);
            },
            ondragleave: move |evt| {
                evt.prevent_default();
                is_dragging.set(false);
            },
            ondrop: move |evt| {
                evt.prevent_default();
                is_dragging.set(false);
                handle_dropped_files(evt, viewer);
            },

            TabBar {}
            if search_visible {
                SearchBar {}
            }
            Content {}
        }
    }
}

/// Open the files dropped onto the window, each in its own tab
fn handle_dropped_files(evt: Event<DragData>, mut viewer: Signal<Viewer>) {
    for file_data in evt.files() {
        let path = file_data.path();
        let resolved = match std::fs::canonicalize(&path) {
            Ok(resolved) => resolved,
            Err(e) => {
                tracing::warn!(?path, %e, "Failed to canonicalize dropped path");
                path
            }
        };
        if resolved.is_dir() {
            tracing::debug!(?resolved, "Ignoring dropped directory");
            continue;
        }
        tracing::info!(?resolved, "Opening dropped file");
        let pending = viewer.write().open_path(resolved);
        run_load(viewer, pending);
    }
}

async fn open_file_dialog(mut viewer: Signal<Viewer>) {
    let Some(file) = rfd::AsyncFileDialog::new()
        .add_filter("Markdown", OPENABLE_EXTENSIONS)
        .pick_file()
        .await
    else {
        tracing::debug!("Open dialog cancelled");
        return;
    };
    let pending = viewer.write().open_path(file.path().to_path_buf());
    run_load(viewer, pending);
}

/// Reload open documents when their files change on disk
fn use_file_watcher(viewer: Signal<Viewer>, config: &WatcherConfig) {
    let enabled = config.enabled;
    let debounce = config.debounce();

    let watcher = use_hook(move || {
        if !enabled {
            tracing::info!("File watching disabled");
            return None;
        }
        let (watcher, mut changes) = FileWatcher::spawn(debounce);
        spawn(async move {
            while let Some(path) = changes.recv().await {
                tracing::info!(?path, "File change detected, reloading");
                let loads = viewer.read().reload_path(&path);
                for load in loads {
                    run_load(viewer, Some(load));
                }
            }
        });
        Some(Rc::new(watcher))
    });

    use_effect(move || {
        let paths = viewer.read().session().open_paths();
        if let Some(watcher) = watcher.clone() {
            spawn(async move {
                if let Err(e) = watcher.sync(&paths).await {
                    tracing::error!(%e, "Failed to update watched files");
                }
            });
        }
    });
}
