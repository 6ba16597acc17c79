use std::fmt::Write;

use super::matcher::Match;
use crate::markdown::{RenderedContent, Segment};

/// Class applied to every highlighted match
pub const HIGHLIGHT_CLASS: &str = "search-highlight";
/// Extra class applied to the current match
pub const CURRENT_CLASS: &str = "search-highlight-current";

/// Produce the content's HTML with every match wrapped in `<mark>`.
///
/// `matches` must be in document order, as returned by
/// [`find_matches`](super::find_matches).
pub fn paint(content: &RenderedContent, matches: &[Match], current: Option<usize>) -> String {
    let mut html = String::with_capacity(content.html().len() + matches.len() * 64);
    let mut pending = matches.iter().enumerate().peekable();

    for (index, segment) in content.segments().iter().enumerate() {
        let text = match segment {
            Segment::Markup(markup) => {
                html.push_str(markup);
                continue;
            }
            Segment::Text(text) => text,
        };

        let mut cursor = 0;
        while let Some((match_index, m)) = pending.next_if(|(_, m)| m.segment == index) {
            html.push_str(&html_escape::encode_text(&text[cursor..m.range.start]));
            let class = if current == Some(match_index) {
                format!("{HIGHLIGHT_CLASS} {CURRENT_CLASS}")
            } else {
                HIGHLIGHT_CLASS.to_string()
            };
            // Writing into a String cannot fail
            let _ = write!(
                html,
                r#"<mark class="{class}" data-match-index="{match_index}">{}</mark>"#,
                html_escape::encode_text(&text[m.range.clone()])
            );
            cursor = m.range.end;
        }
        html.push_str(&html_escape::encode_text(&text[cursor..]));
    }

    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::render_markdown;
    use crate::search::find_matches;

    #[test]
    fn test_paint_without_matches_is_plain_html() {
        let content = render_markdown("# Title\n\nbody & more").unwrap();
        assert_eq!(paint(&content, &[], None), content.html());
    }

    #[test]
    fn test_paint_marks_matches_and_current() {
        let content = render_markdown("# Hi\nfoo foo").unwrap();
        let matches = find_matches(&content, "foo", false);

        let html = paint(&content, &matches, Some(1));

        assert_eq!(
            html,
            concat!(
                "<h1>Hi</h1>\n<p>",
                r#"<mark class="search-highlight" data-match-index="0">foo</mark> "#,
                r#"<mark class="search-highlight search-highlight-current" data-match-index="1">foo</mark>"#,
                "</p>\n"
            )
        );
    }

    #[test]
    fn test_paint_escapes_text_around_matches() {
        let content = render_markdown("a < b & c").unwrap();
        let matches = find_matches(&content, "b", true);

        let html = paint(&content, &matches, Some(0));

        assert!(html.contains("a &lt; <mark"));
        assert!(html.contains(">b</mark> &amp; c"));
    }

    #[test]
    fn test_paint_spans_multiple_segments() {
        let content = render_markdown("foo\n\n**foo**").unwrap();
        let matches = find_matches(&content, "FOO", false);
        assert_eq!(matches.len(), 2);

        let html = paint(&content, &matches, Some(0));

        assert_eq!(html.matches("<mark").count(), 2);
        assert!(html.contains(r#"<strong><mark class="search-highlight" data-match-index="1">foo</mark></strong>"#));
    }
}
