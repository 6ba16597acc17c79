//! Ordered collection of open documents and the active-document pointer.
//!
//! Every mutation that changes durable state (order, paths, titles, active
//! selection) writes the session snapshot to the store right away.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;

use super::document::{Document, DocumentId, LoadError};
use super::load::{CompletedLoad, LoadOrigin, LoadPipeline, PendingLoad};
use super::persistence::{SessionSnapshot, TabEntry, SESSION_KEY, SNAPSHOT_VERSION};
use crate::host::PersistenceStore;
use crate::markdown::RenderedContent;

pub struct SessionManager {
    documents: Vec<Document>,
    active: DocumentId,
    next_id: u64,
    pipeline: LoadPipeline,
    store: Arc<dyn PersistenceStore>,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("documents", &self.documents)
            .field("active", &self.active)
            .field("next_id", &self.next_id)
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    /// Start a fresh session holding one empty document.
    pub fn new(pipeline: LoadPipeline, store: Arc<dyn PersistenceStore>) -> Self {
        let first = DocumentId(0);
        Self {
            documents: vec![Document::empty(first)],
            active: first,
            next_id: 1,
            pipeline,
            store,
        }
    }

    /// Rebuild the session from the persisted snapshot.
    ///
    /// Returns the reloads of every persisted path; a reload that fails
    /// demotes its tab in place instead of dropping it. A malformed snapshot
    /// is discarded and the session starts fresh.
    pub fn restore(
        pipeline: LoadPipeline,
        store: Arc<dyn PersistenceStore>,
    ) -> (Self, Vec<PendingLoad>) {
        let snapshot = match store.get(SESSION_KEY) {
            Some(content) => match SessionSnapshot::parse(&content) {
                Ok(snapshot) => Some(snapshot),
                Err(e) => {
                    tracing::warn!(%e, "Discarding session snapshot");
                    if let Err(e) = store.remove(SESSION_KEY) {
                        tracing::error!(%e, "Failed to remove session snapshot");
                    }
                    None
                }
            },
            None => None,
        };

        let Some(snapshot) = snapshot else {
            tracing::info!("No session to restore, starting fresh");
            return (Self::new(pipeline, store), Vec::new());
        };

        // Ids seen in the snapshot are never handed out again
        let highest = snapshot.tabs.iter().filter_map(|tab| tab.id).max();
        let next_id = highest
            .and_then(|id| id.0.checked_add(1))
            .unwrap_or(0)
            .max(snapshot.next_id);

        let mut session = Self {
            documents: Vec::with_capacity(snapshot.tabs.len()),
            active: DocumentId(0),
            next_id,
            pipeline,
            store,
        };

        let mut seen = HashSet::new();
        let mut pending = Vec::new();
        for TabEntry {
            id,
            source_path,
            title,
        } in snapshot.tabs
        {
            let id = match id.filter(|id| seen.insert(*id)) {
                Some(id) => id,
                None => session.allocate_id(),
            };
            if let Some(path) = &source_path {
                pending.push(PendingLoad::new(
                    id,
                    path.clone(),
                    LoadOrigin::Restore,
                    session.pipeline.clone(),
                ));
            }
            session
                .documents
                .push(Document::restored(id, source_path, title));
        }

        match session.documents.first().map(Document::id) {
            Some(first) => {
                let active = snapshot
                    .active_id
                    .filter(|id| session.position_of(*id).is_some());
                session.active = active.unwrap_or(first);
            }
            None => {
                let id = session.allocate_id();
                session.documents.push(Document::empty(id));
                session.active = id;
            }
        }

        tracing::info!(
            tabs = session.documents.len(),
            active = %session.active,
            "Session restored"
        );
        (session, pending)
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn active_id(&self) -> DocumentId {
        self.active
    }

    pub fn active_document(&self) -> &Document {
        // The collection is never empty and `active` always points into it
        self.document(self.active).unwrap_or(&self.documents[0])
    }

    /// Rendered content of the active document, if it has any
    pub fn active_content(&self) -> Option<&RenderedContent> {
        self.active_document().rendered()
    }

    pub fn document(&self, id: DocumentId) -> Option<&Document> {
        self.documents.iter().find(|doc| doc.id() == id)
    }

    /// 0-based position in the tab order
    pub fn position_of(&self, id: DocumentId) -> Option<usize> {
        self.documents.iter().position(|doc| doc.id() == id)
    }

    /// Document at a 1-based position, as used by numeric shortcuts
    pub fn document_at_position(&self, position: usize) -> Option<DocumentId> {
        position
            .checked_sub(1)
            .and_then(|index| self.documents.get(index))
            .map(Document::id)
    }

    /// Find the document showing the given file
    pub fn find_by_path(&self, path: impl AsRef<Path>) -> Option<DocumentId> {
        let path = path.as_ref();
        self.documents
            .iter()
            .find(|doc| doc.source_path() == Some(path))
            .map(Document::id)
    }

    /// Append a new document and make it active.
    ///
    /// With a path, the returned load must be executed and committed for the
    /// document to show the file.
    pub fn create_document(&mut self, path: Option<PathBuf>) -> (DocumentId, Option<PendingLoad>) {
        let id = self.allocate_id();
        self.documents.push(Document::empty(id));
        self.active = id;
        tracing::debug!(%id, ?path, "Created document");
        self.persist();

        let pending = path.and_then(|path| self.prepare_load(id, path));
        (id, pending)
    }

    /// Capture a load of `path` into document `id`.
    ///
    /// Returns `None` if the document does not exist.
    pub fn prepare_load(&self, id: DocumentId, path: PathBuf) -> Option<PendingLoad> {
        self.document(id)?;
        Some(PendingLoad::new(
            id,
            path,
            LoadOrigin::User,
            self.pipeline.clone(),
        ))
    }

    /// Commit a finished load.
    ///
    /// Success replaces path, title, source and rendered content together.
    /// Failure leaves them as they were and records the error, except for
    /// restore loads which demote the tab to untitled.
    pub fn complete_load(&mut self, done: CompletedLoad) -> Result<(), LoadError> {
        let CompletedLoad {
            id,
            path,
            origin,
            result,
        } = done;

        let Some(doc) = self.documents.iter_mut().find(|doc| doc.id() == id) else {
            tracing::debug!(%id, ?path, "Dropping load for closed document");
            return Err(LoadError::DocumentClosed(id));
        };

        match result {
            Ok(loaded) => {
                doc.apply_loaded(path, loaded.raw, loaded.rendered);
                tracing::info!(%id, title = doc.title(), "Document loaded");
                self.persist();
                Ok(())
            }
            Err(e) => {
                tracing::warn!(%id, %e, ?origin, "Failed to load document");
                match origin {
                    LoadOrigin::User => doc.record_error(e.clone()),
                    LoadOrigin::Restore => {
                        doc.demote(e.clone());
                        self.persist();
                    }
                }
                Err(e)
            }
        }
    }

    /// Load `path` into document `id` and commit the result.
    pub async fn load_into(&mut self, id: DocumentId, path: PathBuf) -> Result<(), LoadError> {
        let pending = self
            .prepare_load(id, path)
            .ok_or(LoadError::DocumentClosed(id))?;
        let done = pending.execute().await;
        self.complete_load(done)
    }

    /// Open a file, reusing tabs where possible.
    ///
    /// A tab already showing `path` is activated. Otherwise the file loads
    /// into the active tab when that tab is still empty, or into a new tab.
    pub fn open_path(&mut self, path: PathBuf) -> Option<PendingLoad> {
        if let Some(id) = self.find_by_path(&path) {
            tracing::debug!(%id, ?path, "File already open, switching");
            self.switch_to(id);
            return None;
        }

        let active = self.active_document();
        if active.is_untitled() && active.rendered().is_none() {
            let id = active.id();
            return self.prepare_load(id, path);
        }

        let (_, pending) = self.create_document(Some(path));
        pending
    }

    /// Prepare reloads of every document showing `path`
    pub fn reload_path(&self, path: &Path) -> Vec<PendingLoad> {
        self.documents
            .iter()
            .filter(|doc| doc.source_path() == Some(path))
            .filter_map(|doc| self.prepare_load(doc.id(), path.to_path_buf()))
            .collect()
    }

    /// Every distinct source path currently open
    pub fn open_paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = Vec::new();
        for path in self.documents.iter().filter_map(Document::source_path) {
            if !paths.iter().any(|seen| seen == path) {
                paths.push(path.to_path_buf());
            }
        }
        paths
    }

    /// Reload the active document from its source file
    pub fn reload_active(&self) -> Option<PendingLoad> {
        let doc = self.active_document();
        let path = doc.source_path()?.to_path_buf();
        self.prepare_load(doc.id(), path)
    }

    /// Make `id` the active document.
    ///
    /// Unknown ids are ignored. Returns `true` when the active document
    /// actually changed.
    pub fn switch_to(&mut self, id: DocumentId) -> bool {
        if self.position_of(id).is_none() {
            tracing::debug!(%id, "Ignoring switch to unknown document");
            return false;
        }
        let changed = self.active != id;
        self.active = id;
        self.persist();
        changed
    }

    /// Close a document.
    ///
    /// Closing the active document activates its right neighbor (or the new
    /// last document when it was rightmost). Closing the last document leaves
    /// a fresh empty one. Returns `true` when the active document changed.
    pub fn close(&mut self, id: DocumentId) -> bool {
        let Some(index) = self.position_of(id) else {
            return false;
        };
        self.documents.remove(index);
        tracing::debug!(%id, "Closed document");

        let was_active = self.active == id;
        if self.documents.is_empty() {
            let fresh = self.allocate_id();
            self.documents.push(Document::empty(fresh));
            self.active = fresh;
        } else if was_active {
            let neighbor = index.min(self.documents.len() - 1);
            self.active = self.documents[neighbor].id();
        }
        self.persist();
        was_active
    }

    /// Close every document except `id`. Returns `true` when the active
    /// document changed.
    pub fn close_others(&mut self, id: DocumentId) -> bool {
        if self.position_of(id).is_none() {
            return false;
        }
        let before = self.documents.len();
        self.documents.retain(|doc| doc.id() == id);
        let changed = self.active != id;
        self.active = id;
        tracing::debug!(%id, closed = before - 1, "Closed other documents");
        self.persist();
        changed
    }

    /// Move a document to `target_index`, clamped to the valid range.
    ///
    /// The active document stays the same document. Returns `true` if the
    /// order changed.
    pub fn reorder(&mut self, id: DocumentId, target_index: usize) -> bool {
        let Some(from) = self.position_of(id) else {
            return false;
        };
        let target = target_index.min(self.documents.len() - 1);
        if from == target {
            return false;
        }
        let doc = self.documents.remove(from);
        self.documents.insert(target, doc);
        tracing::debug!(%id, from, to = target, "Reordered document");
        self.persist();
        true
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            version: SNAPSHOT_VERSION,
            saved_at: Some(Utc::now()),
            tabs: self
                .documents
                .iter()
                .map(|doc| TabEntry {
                    id: Some(doc.id()),
                    source_path: doc.source_path().map(Path::to_path_buf),
                    title: Some(doc.title().to_string()),
                })
                .collect(),
            active_id: Some(self.active),
            next_id: self.next_id,
        }
    }

    /// Write the session snapshot to the store.
    ///
    /// Failures are logged; the in-memory session is unaffected.
    pub fn persist(&self) {
        let snapshot = self.snapshot();
        tracing::trace!(
            tabs = snapshot.tabs.len(),
            active = ?snapshot.active_id,
            "Saving session snapshot"
        );
        match snapshot.to_json() {
            Ok(content) => {
                if let Err(e) = self.store.set(SESSION_KEY, &content) {
                    tracing::error!(%e, "Failed to save session snapshot");
                }
            }
            Err(e) => {
                tracing::error!(%e, "Failed to serialize session snapshot");
            }
        }
    }

    fn allocate_id(&mut self) -> DocumentId {
        let id = DocumentId(self.next_id);
        match self.next_id.checked_add(1) {
            Some(next) => self.next_id = next,
            None => tracing::error!(%id, "Document ids exhausted"),
        }
        id
    }
}
