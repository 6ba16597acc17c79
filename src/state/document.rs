use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::markdown::{RenderError, RenderedContent};

/// Title shown for a document without a source file
pub const UNTITLED: &str = "New Tab";

/// Stable identifier of an open document.
///
/// Allocated monotonically and never reused within a process lifetime.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct DocumentId(pub(crate) u64);

impl DocumentId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Why loading a document failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("Failed to read {}: {message}", .path.display())]
    Unreadable { path: PathBuf, message: String },
    #[error("Failed to render {}: {message}", .path.display())]
    Render { path: PathBuf, message: String },
    #[error("Document {0} was closed before loading finished")]
    DocumentClosed(DocumentId),
}

impl LoadError {
    /// Inline markup shown in place of content that could not be loaded
    pub fn to_markup(&self) -> String {
        format!(
            r#"<p class="error">Failed to load file: {}</p>"#,
            html_escape::encode_text(&self.to_string())
        )
    }
}

impl From<RenderError> for LoadError {
    fn from(e: RenderError) -> Self {
        LoadError::Render {
            path: e.path,
            message: e.message,
        }
    }
}

/// Get the display title for an optional source path
pub fn title_for(path: Option<&Path>) -> String {
    match path {
        Some(path) => path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Unnamed".to_string()),
        None => UNTITLED.to_string(),
    }
}

/// One open document, shown as one tab.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    id: DocumentId,
    source_path: Option<PathBuf>,
    title: String,
    rendered: Option<RenderedContent>,
    raw: Option<String>,
    error: Option<LoadError>,
}

impl Document {
    pub(crate) fn empty(id: DocumentId) -> Self {
        Self {
            id,
            source_path: None,
            title: UNTITLED.to_string(),
            rendered: None,
            raw: None,
            error: None,
        }
    }

    /// Placeholder for a persisted tab whose content is about to be reloaded
    pub(crate) fn restored(id: DocumentId, path: Option<PathBuf>, title: Option<String>) -> Self {
        let title = title.unwrap_or_else(|| title_for(path.as_deref()));
        Self {
            source_path: path,
            title,
            ..Self::empty(id)
        }
    }

    pub fn id(&self) -> DocumentId {
        self.id
    }

    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn rendered(&self) -> Option<&RenderedContent> {
        self.rendered.as_ref()
    }

    pub fn raw(&self) -> Option<&str> {
        self.raw.as_deref()
    }

    pub fn error(&self) -> Option<&LoadError> {
        self.error.as_ref()
    }

    /// No source file: a new tab or a demoted one. Such a tab is reused
    /// when opening a file.
    pub fn is_untitled(&self) -> bool {
        self.source_path.is_none()
    }

    /// Replace every content field at once after a successful load
    pub(crate) fn apply_loaded(&mut self, path: PathBuf, raw: String, rendered: RenderedContent) {
        self.title = title_for(Some(&path));
        self.source_path = Some(path);
        self.raw = Some(raw);
        self.rendered = Some(rendered);
        self.error = None;
    }

    /// Keep the current content and remember the failure
    pub(crate) fn record_error(&mut self, error: LoadError) {
        self.error = Some(error);
    }

    /// Turn into an untitled tab carrying the failure
    pub(crate) fn demote(&mut self, error: LoadError) {
        *self = Self {
            error: Some(error),
            ..Self::empty(self.id)
        };
    }
}
