use dioxus::html::input_data::MouseButton;
use dioxus::prelude::*;

use crate::state::{Document, DocumentId, Viewer};

/// What a tab shows of its document
#[derive(Debug, Clone, PartialEq)]
pub struct TabInfo {
    pub id: DocumentId,
    pub title: String,
    pub tooltip: String,
    pub has_error: bool,
}

impl From<&Document> for TabInfo {
    fn from(doc: &Document) -> Self {
        let tooltip = match (doc.error(), doc.source_path()) {
            (Some(error), _) => error.to_string(),
            (None, Some(path)) => path.display().to_string(),
            (None, None) => doc.title().to_string(),
        };
        Self {
            id: doc.id(),
            title: doc.title().to_string(),
            tooltip,
            has_error: doc.error().is_some(),
        }
    }
}

#[component]
pub fn TabItem(
    index: usize,
    tab: TabInfo,
    is_active: bool,
    dragged: Signal<Option<DocumentId>>,
) -> Element {
    let mut viewer = use_context::<Signal<Viewer>>();
    let mut dragged = dragged;
    let id = tab.id;

    rsx! {
        div {
            class: "tab",
            class: if is_active { "active" },
            class: if tab.has_error { "error" },
            title: "{tab.tooltip}",
            draggable: "true",
            ondragstart: move |_| dragged.set(Some(id)),
            ondragend: move |_| dragged.set(None),
            ondragover: move |evt| evt.prevent_default(),
            ondrop: move |evt| {
                evt.prevent_default();
                if let Some(source) = dragged() {
                    dragged.set(None);
                    viewer.write().reorder(source, index);
                }
            },
            onclick: move |_| viewer.write().switch_to(id),
            // Middle click closes the tab
            onmouseup: move |evt| {
                if evt.trigger_button() == Some(MouseButton::Auxiliary) {
                    viewer.write().close(id);
                }
            },

            span {
                class: "tab-name",
                "{tab.title}"
            }

            button {
                class: "tab-close",
                title: "Close tab",
                onclick: move |evt| {
                    evt.stop_propagation();
                    viewer.write().close(id);
                },
                "×"
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::testing::{MemoryFiles, MemoryStore};
    use crate::markdown::MarkdownRenderer;
    use crate::state::{LoadPipeline, SessionManager};
    use std::path::PathBuf;
    use std::sync::Arc;

    fn session(files: &[(&str, &str)]) -> SessionManager {
        let pipeline = LoadPipeline::new(
            Arc::new(MemoryFiles::with(files)),
            Arc::new(MarkdownRenderer),
        );
        SessionManager::new(pipeline, Arc::new(MemoryStore::default()))
    }

    #[test]
    fn test_tab_info_for_empty_document() {
        let session = session(&[]);
        let info = TabInfo::from(session.active_document());

        assert_eq!(info.title, "New Tab");
        assert_eq!(info.tooltip, "New Tab");
        assert!(!info.has_error);
    }

    #[tokio::test]
    async fn test_tab_info_shows_path_and_error() {
        let mut session = session(&[("/docs/a.md", "a")]);
        let id = session.active_id();
        session.load_into(id, PathBuf::from("/docs/a.md")).await.unwrap();

        let info = TabInfo::from(session.active_document());
        assert_eq!(info.title, "a.md");
        assert_eq!(info.tooltip, "/docs/a.md");

        let _ = session.load_into(id, PathBuf::from("/docs/gone.md")).await;
        let info = TabInfo::from(session.active_document());
        assert!(info.has_error);
        assert!(info.tooltip.contains("gone.md"));
    }
}
