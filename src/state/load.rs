//! Document load pipeline.
//!
//! A load is split so that the session manager is never borrowed across the
//! file read:
//!
//! 1. [`SessionManager::prepare_load`](super::SessionManager::prepare_load)
//!    captures the request as a [`PendingLoad`].
//! 2. [`PendingLoad::execute`] reads and renders without touching the session.
//! 3. [`SessionManager::complete_load`](super::SessionManager::complete_load)
//!    commits the outcome atomically.
//!
//! Loads are neither coalesced nor cancellable. Two loads on one document
//! both commit, in completion order, so the last one to finish wins.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::document::{DocumentId, LoadError};
use crate::host::{FileAccess, Renderer};
use crate::markdown::RenderedContent;

/// The collaborators a load needs.
#[derive(Clone)]
pub struct LoadPipeline {
    files: Arc<dyn FileAccess>,
    renderer: Arc<dyn Renderer>,
}

impl LoadPipeline {
    pub fn new(files: Arc<dyn FileAccess>, renderer: Arc<dyn Renderer>) -> Self {
        Self { files, renderer }
    }

    async fn load(&self, path: &Path) -> Result<Loaded, LoadError> {
        let raw = self
            .files
            .read_file(path)
            .await
            .map_err(|e| LoadError::Unreadable {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        let rendered = self.renderer.render(&raw, path)?;
        Ok(Loaded { raw, rendered })
    }
}

impl std::fmt::Debug for LoadPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadPipeline").finish_non_exhaustive()
    }
}

/// What a failed load does to its document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOrigin {
    /// Explicit open or reload: keep prior content, show the error
    User,
    /// Reload of a persisted tab: demote the tab to untitled
    Restore,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Loaded {
    pub(crate) raw: String,
    pub(crate) rendered: RenderedContent,
}

/// A load that has been requested but not yet performed.
#[must_use = "a pending load does nothing until executed"]
#[derive(Debug)]
pub struct PendingLoad {
    id: DocumentId,
    path: PathBuf,
    origin: LoadOrigin,
    pipeline: LoadPipeline,
}

impl PendingLoad {
    pub(crate) fn new(
        id: DocumentId,
        path: PathBuf,
        origin: LoadOrigin,
        pipeline: LoadPipeline,
    ) -> Self {
        Self {
            id,
            path,
            origin,
            pipeline,
        }
    }

    pub fn id(&self) -> DocumentId {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and render the file.
    pub async fn execute(self) -> CompletedLoad {
        tracing::info!(id = %self.id, path = ?self.path, "Loading document");
        let result = self.pipeline.load(&self.path).await;
        CompletedLoad {
            id: self.id,
            path: self.path,
            origin: self.origin,
            result,
        }
    }
}

/// The outcome of [`PendingLoad::execute`], ready to be committed.
#[must_use = "a completed load must be committed to the session"]
#[derive(Debug)]
pub struct CompletedLoad {
    pub(crate) id: DocumentId,
    pub(crate) path: PathBuf,
    pub(crate) origin: LoadOrigin,
    pub(crate) result: Result<Loaded, LoadError>,
}

impl CompletedLoad {
    pub fn id(&self) -> DocumentId {
        self.id
    }

    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::testing::MemoryFiles;
    use crate::markdown::{MarkdownRenderer, RenderError};

    struct FailingRenderer;

    impl Renderer for FailingRenderer {
        fn render(&self, _source: &str, path: &Path) -> Result<RenderedContent, RenderError> {
            Err(RenderError {
                path: path.to_path_buf(),
                message: "malformed".to_string(),
            })
        }
    }

    fn pending(pipeline: LoadPipeline, path: &str) -> PendingLoad {
        PendingLoad::new(DocumentId(1), PathBuf::from(path), LoadOrigin::User, pipeline)
    }

    #[tokio::test]
    async fn test_execute_success() {
        let pipeline = LoadPipeline::new(
            Arc::new(MemoryFiles::with(&[("/x.md", "# Hi")])),
            Arc::new(MarkdownRenderer),
        );

        let done = pending(pipeline, "/x.md").execute().await;

        assert_eq!(done.id(), DocumentId(1));
        let loaded = done.result.unwrap();
        assert_eq!(loaded.raw, "# Hi");
        assert!(loaded.rendered.html().contains("<h1>Hi</h1>"));
    }

    #[tokio::test]
    async fn test_execute_unreadable() {
        let pipeline = LoadPipeline::new(Arc::new(MemoryFiles::default()), Arc::new(MarkdownRenderer));

        let done = pending(pipeline, "/missing.md").execute().await;

        assert!(!done.is_ok());
        assert!(matches!(
            done.result,
            Err(LoadError::Unreadable { ref path, .. }) if path == Path::new("/missing.md")
        ));
    }

    #[tokio::test]
    async fn test_execute_render_failure() {
        let pipeline = LoadPipeline::new(
            Arc::new(MemoryFiles::with(&[("/x.md", "# Hi")])),
            Arc::new(FailingRenderer),
        );

        let done = pending(pipeline, "/x.md").execute().await;

        assert_eq!(
            done.result.unwrap_err(),
            LoadError::Render {
                path: PathBuf::from("/x.md"),
                message: "malformed".to_string(),
            }
        );
    }
}
