//! Capabilities the core consumes from its host.
//!
//! The session and search managers never touch the filesystem, the
//! clipboard or the system browser directly. They go through these traits so
//! that the core can be driven by in-memory fakes in tests and by the real
//! bindings (`tokio::fs`, `arboard`, `open`, the JSON file store) in the app.

use async_trait::async_trait;
use std::io;
use std::path::Path;
use thiserror::Error;

use crate::markdown::{RenderError, RenderedContent};

/// Reads document sources.
#[async_trait]
pub trait FileAccess: Send + Sync {
    async fn read_file(&self, path: &Path) -> io::Result<String>;
}

/// Turns markdown source into rendered content.
///
/// Must be pure: identical input yields identical output.
pub trait Renderer: Send + Sync {
    fn render(&self, source: &str, path: &Path) -> Result<RenderedContent, RenderError>;
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to access state store at {}: {source}", .path.display())]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Application-scoped key/value storage surviving restarts.
pub trait PersistenceStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("Clipboard is unavailable: {0}")]
    Unavailable(String),
    #[error("Failed to write to clipboard: {0}")]
    Write(String),
}

pub trait Clipboard {
    fn write_text(&self, text: &str) -> Result<(), ClipboardError>;
}

#[derive(Debug, Error)]
#[error("Failed to open {target}: {message}")]
pub struct OpenError {
    pub target: String,
    pub message: String,
}

/// Opens link targets outside the viewer.
pub trait LinkOpener {
    fn open_external(&self, target: &str) -> Result<(), OpenError>;
}

/// Default [`FileAccess`] backed by `tokio::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioFileAccess;

#[async_trait]
impl FileAccess for TokioFileAccess {
    async fn read_file(&self, path: &Path) -> io::Result<String> {
        tokio::fs::read_to_string(path).await
    }
}
