//! The viewer context: one session and one search, wired together.
//!
//! Every operation that can change what the active document shows hands the
//! new content to the search manager before returning.

use std::path::{Path, PathBuf};

use super::document::{DocumentId, LoadError};
use super::load::{CompletedLoad, PendingLoad};
use super::session::SessionManager;
use crate::host::{Clipboard, LinkOpener};
use crate::markdown::{resolve_link, LinkTarget};
use crate::search::{MatchInfo, SearchManager};
use crate::utils::file::is_markdown_file;
use crate::utils::opener::open_with_fallback;

/// What the UI still has to do after a link click
#[derive(Debug)]
pub enum LinkOutcome {
    /// Scroll to the element with this id
    ScrollTo(String),
    /// Run this load and commit it
    Load(PendingLoad),
    /// Nothing left to do
    Handled,
}

#[derive(Debug)]
pub struct Viewer {
    session: SessionManager,
    search: SearchManager,
}

impl Viewer {
    pub fn new(session: SessionManager, search: SearchManager) -> Self {
        Self { session, search }
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn search(&self) -> &SearchManager {
        &self.search
    }

    // === Documents ===

    pub fn new_document(&mut self) -> DocumentId {
        let (id, _) = self.session.create_document(None);
        self.sync_search();
        id
    }

    pub fn open_path(&mut self, path: PathBuf) -> Option<PendingLoad> {
        let before = self.session.active_id();
        let pending = self.session.open_path(path);
        if self.session.active_id() != before {
            self.sync_search();
        }
        pending
    }

    /// Commit a finished load; the search follows when it hit the active document.
    pub fn complete_load(&mut self, done: CompletedLoad) -> Result<(), LoadError> {
        let id = done.id();
        let result = self.session.complete_load(done);
        if id == self.session.active_id() {
            self.sync_search();
        }
        result
    }

    pub fn reload_active(&self) -> Option<PendingLoad> {
        self.session.reload_active()
    }

    pub fn reload_path(&self, path: &Path) -> Vec<PendingLoad> {
        self.session.reload_path(path)
    }

    pub fn switch_to(&mut self, id: DocumentId) {
        if self.session.switch_to(id) {
            self.sync_search();
        }
    }

    /// Switch by 1-based tab position. Out-of-range positions are ignored.
    pub fn switch_to_position(&mut self, position: usize) {
        if let Some(id) = self.session.document_at_position(position) {
            self.switch_to(id);
        }
    }

    pub fn close(&mut self, id: DocumentId) {
        if self.session.close(id) {
            self.sync_search();
        }
    }

    pub fn close_active(&mut self) {
        self.close(self.session.active_id());
    }

    pub fn close_others(&mut self, id: DocumentId) {
        if self.session.close_others(id) {
            self.sync_search();
        }
    }

    pub fn reorder(&mut self, id: DocumentId, target_index: usize) {
        self.session.reorder(id, target_index);
    }

    // === Search ===

    pub fn toggle_search(&mut self) {
        self.search.toggle_visible();
        self.sync_search();
    }

    pub fn show_search(&mut self) {
        if !self.search.is_visible() {
            self.search.set_visible(true);
            self.sync_search();
        }
    }

    pub fn hide_search(&mut self) {
        self.search.set_visible(false);
    }

    pub fn set_query(&mut self, text: impl Into<String>) {
        self.search.set_query(text, self.session.active_content());
    }

    pub fn toggle_case_sensitive(&mut self) {
        self.search
            .toggle_case_sensitive(self.session.active_content());
    }

    pub fn next_match(&mut self) {
        self.search.next();
    }

    pub fn previous_match(&mut self) {
        self.search.previous();
    }

    pub fn match_info(&self) -> MatchInfo {
        self.search.match_info()
    }

    // === Presentation ===

    /// Markup for the content area of the active document.
    ///
    /// Highlights are painted while the search bar is open. A document that
    /// never loaded but failed shows its error inline.
    pub fn active_html(&self) -> String {
        let doc = self.session.active_document();
        match doc.rendered() {
            Some(content) if self.search.is_visible() => self.search.highlighted_html(content),
            Some(content) => content.html().to_string(),
            None => doc
                .error()
                .map(LoadError::to_markup)
                .unwrap_or_default(),
        }
    }

    /// Error shown above content that is still displayed after a failed reload
    pub fn error_banner(&self) -> Option<String> {
        let doc = self.session.active_document();
        doc.rendered()?;
        doc.error().map(ToString::to_string)
    }

    // === Host actions ===

    /// Copy the active document's markdown source
    pub fn copy_source(&self, clipboard: &dyn Clipboard) {
        let Some(raw) = self.session.active_document().raw() else {
            tracing::debug!("Nothing to copy: active document has no source");
            return;
        };
        if let Err(e) = clipboard.write_text(raw) {
            tracing::error!(%e, "Failed to copy source");
        }
    }

    /// Copy the active document's rendered markup, without search highlights
    pub fn copy_rendered(&self, clipboard: &dyn Clipboard) {
        let Some(content) = self.session.active_content() else {
            tracing::debug!("Nothing to copy: active document has no content");
            return;
        };
        if let Err(e) = clipboard.write_text(content.html()) {
            tracing::error!(%e, "Failed to copy rendered content");
        }
    }

    /// Follow a link clicked in the active document.
    ///
    /// Relative links resolve against the document's directory. Markdown
    /// files open in the viewer, everything else goes to the opener.
    pub fn open_link(
        &mut self,
        href: &str,
        opener: &dyn LinkOpener,
        fallback: &dyn LinkOpener,
    ) -> LinkOutcome {
        let base_dir = self
            .session
            .active_document()
            .source_path()
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .unwrap_or_default();

        match resolve_link(href, &base_dir) {
            LinkTarget::Anchor(anchor) => LinkOutcome::ScrollTo(anchor),
            LinkTarget::External(url) => {
                open_with_fallback(opener, fallback, &url);
                LinkOutcome::Handled
            }
            LinkTarget::Local(path) if is_markdown_file(&path) => match self.open_path(path) {
                Some(pending) => LinkOutcome::Load(pending),
                None => LinkOutcome::Handled,
            },
            LinkTarget::Local(path) => {
                open_with_fallback(opener, fallback, &path.to_string_lossy());
                LinkOutcome::Handled
            }
        }
    }

    fn sync_search(&mut self) {
        self.search
            .on_active_document_changed(self.session.active_content());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::testing::{MemoryFiles, MemoryStore, RecordingClipboard, RecordingOpener};
    use crate::markdown::MarkdownRenderer;
    use crate::state::LoadPipeline;
    use std::sync::Arc;

    fn viewer(files: &[(&str, &str)]) -> Viewer {
        let pipeline = LoadPipeline::new(
            Arc::new(MemoryFiles::with(files)),
            Arc::new(MarkdownRenderer),
        );
        let session = SessionManager::new(pipeline, Arc::new(MemoryStore::default()));
        Viewer::new(session, SearchManager::default())
    }

    async fn run(viewer: &mut Viewer, pending: Option<PendingLoad>) {
        if let Some(pending) = pending {
            let done = pending.execute().await;
            let _ = viewer.complete_load(done);
        }
    }

    async fn open(viewer: &mut Viewer, path: &str) -> DocumentId {
        let pending = viewer.open_path(PathBuf::from(path));
        run(viewer, pending).await;
        viewer.session().active_id()
    }

    #[tokio::test]
    async fn test_search_follows_switch_and_keeps_query() {
        let mut viewer = viewer(&[("/a.md", "foo foo foo"), ("/b.md", "one foo")]);
        let a = open(&mut viewer, "/a.md").await;
        let b = open(&mut viewer, "/b.md").await;
        viewer.switch_to(a);
        viewer.show_search();
        viewer.set_query("foo");
        viewer.next_match();
        assert_eq!(viewer.match_info().to_string(), "2 of 3");

        viewer.switch_to(b);

        assert_eq!(viewer.search().query(), "foo");
        assert_eq!(viewer.match_info().to_string(), "1 of 1");
    }

    #[tokio::test]
    async fn test_search_recomputes_when_active_document_loads() {
        let mut viewer = viewer(&[("/a.md", "foo bar foo")]);
        viewer.show_search();
        viewer.set_query("foo");
        assert_eq!(viewer.match_info(), MatchInfo::NoMatches);

        open(&mut viewer, "/a.md").await;

        assert_eq!(viewer.match_info().to_string(), "1 of 2");
    }

    #[tokio::test]
    async fn test_search_recomputes_after_closing_active() {
        let mut viewer = viewer(&[("/a.md", "foo"), ("/b.md", "nothing")]);
        open(&mut viewer, "/a.md").await;
        let b = open(&mut viewer, "/b.md").await;
        viewer.show_search();
        viewer.set_query("foo");
        assert_eq!(viewer.match_info(), MatchInfo::NoMatches);

        viewer.close(b);

        assert_eq!(viewer.match_info().to_string(), "1 of 1");
    }

    #[tokio::test]
    async fn test_active_html_highlights_only_while_searching() {
        let mut viewer = viewer(&[("/a.md", "foo")]);
        open(&mut viewer, "/a.md").await;
        viewer.show_search();
        viewer.set_query("foo");
        assert!(viewer.active_html().contains("<mark"));

        viewer.hide_search();

        assert_eq!(viewer.active_html(), "<p>foo</p>\n");
    }

    #[tokio::test]
    async fn test_failed_first_load_shows_inline_error() {
        let mut viewer = viewer(&[]);
        open(&mut viewer, "/missing.md").await;

        assert!(viewer
            .active_html()
            .starts_with(r#"<p class="error">Failed to load file:"#));
        assert!(viewer.error_banner().is_none());
    }

    #[tokio::test]
    async fn test_failed_reload_keeps_content_with_banner() {
        let files = Arc::new(MemoryFiles::with(&[("/a.md", "hello")]));
        let pipeline = LoadPipeline::new(files.clone(), Arc::new(MarkdownRenderer));
        let session = SessionManager::new(pipeline, Arc::new(MemoryStore::default()));
        let mut viewer = Viewer::new(session, SearchManager::default());
        open(&mut viewer, "/a.md").await;

        files.remove("/a.md");
        let pending = viewer.reload_active();
        run(&mut viewer, pending).await;

        assert_eq!(viewer.active_html(), "<p>hello</p>\n");
        assert!(viewer.error_banner().unwrap().contains("/a.md"));
    }

    #[test]
    fn test_switch_to_position_out_of_range_is_ignored() {
        let mut viewer = viewer(&[]);
        let first = viewer.session().active_id();
        viewer.new_document();

        viewer.switch_to_position(9);
        assert_ne!(viewer.session().active_id(), first);

        viewer.switch_to_position(1);
        assert_eq!(viewer.session().active_id(), first);
    }

    #[tokio::test]
    async fn test_copy_source_and_rendered() {
        let mut viewer = viewer(&[("/a.md", "# Hi")]);
        open(&mut viewer, "/a.md").await;
        viewer.show_search();
        viewer.set_query("Hi");
        let clipboard = RecordingClipboard::default();

        viewer.copy_source(&clipboard);
        viewer.copy_rendered(&clipboard);

        assert_eq!(*clipboard.written.lock(), vec!["# Hi", "<h1>Hi</h1>\n"]);
    }

    #[test]
    fn test_copy_failure_is_not_fatal() {
        let viewer = viewer(&[]);
        let clipboard = RecordingClipboard {
            fail: true,
            ..Default::default()
        };

        // Nothing loaded and a broken clipboard: both are logged only
        viewer.copy_source(&clipboard);
        viewer.copy_rendered(&clipboard);
        assert!(clipboard.written.lock().is_empty());
    }

    #[tokio::test]
    async fn test_open_link_variants() {
        let mut viewer = viewer(&[("/docs/a.md", "[b](b.md)"), ("/docs/b.md", "bee")]);
        open(&mut viewer, "/docs/a.md").await;
        let opener = RecordingOpener::default();
        let fallback = RecordingOpener::default();

        assert!(matches!(
            viewer.open_link("#intro", &opener, &fallback),
            LinkOutcome::ScrollTo(anchor) if anchor == "intro"
        ));

        assert!(matches!(
            viewer.open_link("https://example.com", &opener, &fallback),
            LinkOutcome::Handled
        ));
        assert_eq!(*opener.opened.lock(), vec!["https://example.com"]);

        assert!(matches!(
            viewer.open_link("image.png", &opener, &fallback),
            LinkOutcome::Handled
        ));
        assert_eq!(opener.opened.lock()[1], "/docs/image.png");

        let LinkOutcome::Load(pending) = viewer.open_link("b.md", &opener, &fallback) else {
            panic!("expected a load for a markdown link");
        };
        assert_eq!(pending.path(), Path::new("/docs/b.md"));
        run(&mut viewer, Some(pending)).await;
        assert_eq!(viewer.session().active_document().title(), "b.md");
        assert!(fallback.opened.lock().is_empty());
    }
}
