use std::fmt;

use super::highlight::paint;
use super::matcher::{find_matches, Match};
use crate::markdown::RenderedContent;

/// What the match counter in the search bar shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchInfo {
    /// No query entered
    Idle,
    /// Query entered but nothing found
    NoMatches,
    /// 1-based position of the current match out of `total`
    At { position: usize, total: usize },
}

impl fmt::Display for MatchInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchInfo::Idle => f.write_str("0 of 0"),
            MatchInfo::NoMatches => f.write_str("No matches"),
            MatchInfo::At { position, total } => write!(f, "{position} of {total}"),
        }
    }
}

/// Search state scoped to the active document.
///
/// Every method that can change the results takes the active document's
/// rendered content, so matches are always derived from the content they
/// are shown against.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchManager {
    visible: bool,
    query: String,
    case_sensitive: bool,
    default_case_sensitive: bool,
    matches: Vec<Match>,
    current: Option<usize>,
}

impl Default for SearchManager {
    fn default() -> Self {
        Self::new(false)
    }
}

impl SearchManager {
    pub fn new(case_sensitive: bool) -> Self {
        Self {
            visible: false,
            query: String::new(),
            case_sensitive,
            default_case_sensitive: case_sensitive,
            matches: Vec::new(),
            current: None,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn is_case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    pub fn matches(&self) -> &[Match] {
        &self.matches
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current_match(&self) -> Option<&Match> {
        self.current.and_then(|index| self.matches.get(index))
    }

    /// Show or hide the search bar.
    ///
    /// Hiding drops the query, the matches and the case toggle, so every
    /// show starts from an empty query.
    pub fn set_visible(&mut self, visible: bool) {
        if !visible {
            self.query.clear();
            self.case_sensitive = self.default_case_sensitive;
            self.clear_matches();
        }
        self.visible = visible;
        tracing::debug!(visible, "Search visibility changed");
    }

    pub fn toggle_visible(&mut self) {
        self.set_visible(!self.visible);
    }

    /// Replace the query. Returns `false` when the query is unchanged.
    pub fn set_query(&mut self, text: impl Into<String>, content: Option<&RenderedContent>) -> bool {
        let text = text.into();
        if text == self.query {
            return false;
        }
        self.query = text;
        self.recompute(content);
        true
    }

    pub fn toggle_case_sensitive(&mut self, content: Option<&RenderedContent>) {
        self.case_sensitive = !self.case_sensitive;
        if !self.query.is_empty() {
            self.recompute(content);
        }
    }

    /// Rebuild the matches from the query and `content`.
    pub fn recompute(&mut self, content: Option<&RenderedContent>) {
        self.matches = match content {
            Some(content) if !self.query.is_empty() => {
                find_matches(content, &self.query, self.case_sensitive)
            }
            _ => Vec::new(),
        };
        self.current = if self.matches.is_empty() { None } else { Some(0) };
        tracing::trace!(
            query = %self.query,
            case_sensitive = self.case_sensitive,
            count = self.matches.len(),
            "Search recomputed"
        );
    }

    pub fn next(&mut self) {
        if let Some(current) = self.current {
            self.current = Some((current + 1) % self.matches.len());
        }
    }

    pub fn previous(&mut self) {
        if let Some(current) = self.current {
            let total = self.matches.len();
            self.current = Some((current + total - 1) % total);
        }
    }

    /// Re-derive the matches for a newly active document, keeping the query.
    pub fn on_active_document_changed(&mut self, content: Option<&RenderedContent>) {
        if !self.visible {
            return;
        }
        self.clear_matches();
        self.recompute(content);
    }

    pub fn match_info(&self) -> MatchInfo {
        match self.current {
            _ if self.query.is_empty() => MatchInfo::Idle,
            Some(index) => MatchInfo::At {
                position: index + 1,
                total: self.matches.len(),
            },
            None => MatchInfo::NoMatches,
        }
    }

    /// The content's HTML with the current matches highlighted.
    pub fn highlighted_html(&self, content: &RenderedContent) -> String {
        paint(content, &self.matches, self.current)
    }

    fn clear_matches(&mut self) {
        self.matches.clear();
        self.current = None;
    }
}
