use std::ops::Range;

use crate::markdown::RenderedContent;

/// One occurrence of the query inside a text segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    /// Index into [`RenderedContent::segments`]
    pub segment: usize,
    /// Byte range within that segment's text
    pub range: Range<usize>,
}

/// Find all matches of `query` in the content's text segments, in document order.
pub fn find_matches(content: &RenderedContent, query: &str, case_sensitive: bool) -> Vec<Match> {
    if query.is_empty() {
        return Vec::new();
    }
    content
        .text_segments()
        .flat_map(|(segment, text)| {
            find_in_text(text, query, case_sensitive)
                .into_iter()
                .map(move |range| Match { segment, range })
        })
        .collect()
}

/// Non-overlapping, left-to-right occurrences of `query` as a literal string.
///
/// Ranges are byte offsets into `text` and always fall on char boundaries.
pub fn find_in_text(text: &str, query: &str, case_sensitive: bool) -> Vec<Range<usize>> {
    if query.is_empty() {
        return Vec::new();
    }
    if case_sensitive {
        return text
            .match_indices(query)
            .map(|(start, found)| start..start + found.len())
            .collect();
    }

    let folded = Folded::new(text);
    let query = fold(query);
    let mut ranges: Vec<Range<usize>> = Vec::new();
    for (start, found) in folded.text.match_indices(query.as_str()) {
        let range = folded.original_range(start..start + found.len());
        // A char whose lowercase form expands can be claimed by two matches
        if ranges.last().is_some_and(|last| range.start < last.end) {
            continue;
        }
        ranges.push(range);
    }
    ranges
}

fn fold(text: &str) -> String {
    text.chars().flat_map(char::to_lowercase).collect()
}

/// Lowercased text with a map back to the original byte offsets.
struct Folded {
    text: String,
    /// For every byte of `text`, the byte range of the original char it came from
    origins: Vec<Range<usize>>,
}

impl Folded {
    fn new(original: &str) -> Self {
        let mut text = String::with_capacity(original.len());
        let mut origins = Vec::with_capacity(original.len());
        for (start, c) in original.char_indices() {
            let origin = start..start + c.len_utf8();
            for lower in c.to_lowercase() {
                text.push(lower);
                origins.extend(std::iter::repeat(origin.clone()).take(lower.len_utf8()));
            }
        }
        Self { text, origins }
    }

    fn original_range(&self, folded: Range<usize>) -> Range<usize> {
        let start = self.origins[folded.start].start;
        let end = self.origins[folded.end - 1].end;
        start..end
    }
}
