mod links;

pub use links::{resolve_link, LinkTarget};

use anyhow::Result;
use pulldown_cmark::{
    html, CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd, TextMergeStream,
};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::host::Renderer;
use crate::utils::file::is_markdown_file;

/// Opens a text placeholder inside the intermediate HTML.
const PLACEHOLDER_OPEN: char = '\u{E000}';
/// Closes a text placeholder inside the intermediate HTML.
const PLACEHOLDER_CLOSE: char = '\u{E001}';

#[derive(Debug, Clone, Error)]
#[error("Failed to render {}: {message}", .path.display())]
pub struct RenderError {
    pub path: PathBuf,
    pub message: String,
}

/// One piece of rendered output, in document order.
///
/// `Markup` is emitted verbatim; `Text` is the unescaped text of one rendered
/// text node. Search runs over `Text` segments only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Markup(String),
    Text(String),
}

/// Rendered form of a document: final HTML plus the segment model it was
/// assembled from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RenderedContent {
    html: String,
    segments: Vec<Segment>,
}

impl RenderedContent {
    pub fn from_segments(segments: Vec<Segment>) -> Self {
        let mut html = String::new();
        for segment in &segments {
            match segment {
                Segment::Markup(markup) => html.push_str(markup),
                Segment::Text(text) => html.push_str(&html_escape::encode_text(text)),
            }
        }
        Self { html, segments }
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Text segments with their index in [`Self::segments`].
    pub fn text_segments(&self) -> impl Iterator<Item = (usize, &str)> {
        self.segments
            .iter()
            .enumerate()
            .filter_map(|(index, segment)| match segment {
                Segment::Text(text) => Some((index, text.as_str())),
                Segment::Markup(_) => None,
            })
    }
}

/// Markdown renderer backed by pulldown-cmark.
///
/// Files without a markdown extension are shown as preformatted plain text.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownRenderer;

impl Renderer for MarkdownRenderer {
    fn render(&self, source: &str, path: &Path) -> Result<RenderedContent, RenderError> {
        if !is_markdown_file(path) {
            tracing::debug!(?path, "Rendering non-markdown file as plain text");
            return Ok(render_plain_text(source));
        }
        render_markdown(source).map_err(|e| RenderError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

/// Render Markdown into the segment model
pub fn render_markdown(markdown: impl AsRef<str>) -> Result<RenderedContent> {
    let markdown = markdown.as_ref();

    // Enable GitHub Flavored Markdown options
    let options = Options::all();

    // Adjacent text events are merged so that every rendered text node is one segment
    let parser = TextMergeStream::new(Parser::new_ext(markdown, options));

    let mut texts: Vec<String> = Vec::new();
    let mut html_output = String::new();
    {
        // Text inside image alt attributes and metadata blocks never reaches the
        // visible document, so it does not become a text segment.
        let mut hidden_depth = 0usize;
        let events = parser.map(|event| match event {
            Event::Start(tag @ (Tag::Image { .. } | Tag::MetadataBlock(_))) => {
                hidden_depth += 1;
                Event::Start(scrub_tag(tag))
            }
            Event::End(TagEnd::Image | TagEnd::MetadataBlock(_)) => {
                hidden_depth = hidden_depth.saturating_sub(1);
                event
            }
            Event::Text(text) if hidden_depth == 0 => {
                let placeholder = push_placeholder(&mut texts, &text);
                Event::InlineHtml(CowStr::from(placeholder))
            }
            Event::Code(code) if hidden_depth == 0 => {
                let placeholder = push_placeholder(&mut texts, &code);
                Event::InlineHtml(CowStr::from(format!("<code>{placeholder}</code>")))
            }
            // Placeholder characters reaching the output any other way (raw HTML,
            // attributes, decoded entities) must not parse as placeholders
            Event::Start(tag) => Event::Start(scrub_tag(tag)),
            Event::Text(text) => Event::Text(scrub(text)),
            Event::Code(code) => Event::Code(scrub(code)),
            Event::Html(markup) => Event::Html(scrub(markup)),
            Event::InlineHtml(markup) => Event::InlineHtml(scrub(markup)),
            Event::InlineMath(math) => Event::InlineMath(scrub(math)),
            Event::DisplayMath(math) => Event::DisplayMath(scrub(math)),
            Event::FootnoteReference(label) => Event::FootnoteReference(scrub(label)),
            other => other,
        });
        html::push_html(&mut html_output, events);
    }

    Ok(RenderedContent::from_segments(split_placeholders(
        &html_output,
        texts,
    )))
}

fn render_plain_text(source: &str) -> RenderedContent {
    RenderedContent::from_segments(vec![
        Segment::Markup(r#"<pre class="plain-text-viewer">"#.to_string()),
        Segment::Text(source.to_string()),
        Segment::Markup("</pre>".to_string()),
    ])
}

fn push_placeholder(texts: &mut Vec<String>, text: &str) -> String {
    let index = texts.len();
    texts.push(scrub(CowStr::from(text)).into_string());
    format!("{PLACEHOLDER_OPEN}{index}{PLACEHOLDER_CLOSE}")
}

/// Replace placeholder characters coming from the document with U+FFFD
fn scrub(text: CowStr<'_>) -> CowStr<'_> {
    if text.contains([PLACEHOLDER_OPEN, PLACEHOLDER_CLOSE]) {
        CowStr::from(text.replace([PLACEHOLDER_OPEN, PLACEHOLDER_CLOSE], "\u{FFFD}"))
    } else {
        text
    }
}

fn scrub_tag(tag: Tag<'_>) -> Tag<'_> {
    match tag {
        Tag::Heading {
            level,
            id,
            classes,
            attrs,
        } => Tag::Heading {
            level,
            id: id.map(scrub),
            classes: classes.into_iter().map(scrub).collect(),
            attrs: attrs
                .into_iter()
                .map(|(key, value)| (scrub(key), value.map(scrub)))
                .collect(),
        },
        Tag::CodeBlock(CodeBlockKind::Fenced(info)) => {
            Tag::CodeBlock(CodeBlockKind::Fenced(scrub(info)))
        }
        Tag::FootnoteDefinition(label) => Tag::FootnoteDefinition(scrub(label)),
        Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        } => Tag::Link {
            link_type,
            dest_url: scrub(dest_url),
            title: scrub(title),
            id,
        },
        Tag::Image {
            link_type,
            dest_url,
            title,
            id,
        } => Tag::Image {
            link_type,
            dest_url: scrub(dest_url),
            title: scrub(title),
            id,
        },
        other => other,
    }
}

/// Split intermediate HTML back into markup and text segments.
///
/// Anything that does not parse as a known placeholder stays markup.
fn split_placeholders(html: &str, mut texts: Vec<String>) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut markup = String::new();
    let mut rest = html;

    while let Some(open) = rest.find(PLACEHOLDER_OPEN) {
        let after_open = &rest[open + PLACEHOLDER_OPEN.len_utf8()..];
        let parsed = after_open.find(PLACEHOLDER_CLOSE).and_then(|close| {
            let index: usize = after_open[..close].parse().ok()?;
            (index < texts.len()).then_some((index, close))
        });

        match parsed {
            Some((index, close)) => {
                markup.push_str(&rest[..open]);
                if !markup.is_empty() {
                    segments.push(Segment::Markup(std::mem::take(&mut markup)));
                }
                segments.push(Segment::Text(std::mem::take(&mut texts[index])));
                rest = &after_open[close + PLACEHOLDER_CLOSE.len_utf8()..];
            }
            None => {
                markup.push_str(&rest[..open + PLACEHOLDER_OPEN.len_utf8()]);
                rest = after_open;
            }
        }
    }

    markup.push_str(rest);
    if !markup.is_empty() {
        segments.push(Segment::Markup(markup));
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    fn texts(content: &RenderedContent) -> Vec<&str> {
        content.text_segments().map(|(_, text)| text).collect()
    }

    #[test]
    fn test_render_markdown_basic() {
        let result = render_markdown("# Hello\n\nThis is a test.").unwrap();

        assert!(result.html().contains("<h1>Hello</h1>"));
        assert!(result.html().contains("<p>This is a test.</p>"));
        assert_eq!(texts(&result), vec!["Hello", "This is a test."]);
    }

    #[test]
    fn test_render_markdown_matches_pulldown_output() {
        let markdown = indoc! {"
            # Title

            Some *emphasis* and `code` & <angle> text.

            | A | B |
            |---|---|
            | 1 | 2 |

            - [ ] task
            - item
        "};
        let result = render_markdown(markdown).unwrap();

        let mut expected = String::new();
        html::push_html(&mut expected, Parser::new_ext(markdown, Options::all()));
        assert_eq!(result.html(), expected);
    }

    #[test]
    fn test_heading_and_paragraph_segments() {
        let result = render_markdown("# Hi\nfoo foo").unwrap();
        assert_eq!(texts(&result), vec!["Hi", "foo foo"]);
    }

    #[test]
    fn test_text_is_unescaped_in_segments() {
        let result = render_markdown("a & b < c").unwrap();
        assert_eq!(texts(&result), vec!["a & b < c"]);
        assert!(result.html().contains("a &amp; b &lt; c"));
    }

    #[test]
    fn test_inline_code_is_a_text_segment() {
        let result = render_markdown("call `foo()` now").unwrap();
        assert_eq!(texts(&result), vec!["call ", "foo()", " now"]);
        assert!(result.html().contains("<code>foo()</code>"));
    }

    #[test]
    fn test_code_block_text_is_searchable() {
        let markdown = indoc! {"
            ```rust
            fn main() {}
            ```
        "};
        let result = render_markdown(markdown).unwrap();
        assert_eq!(texts(&result), vec!["fn main() {}\n"]);
        assert!(result.html().contains("language-rust"));
    }

    #[test]
    fn test_image_alt_text_is_not_a_segment() {
        let result = render_markdown("![diagram alt](img.png)").unwrap();
        assert!(texts(&result).is_empty());
        assert!(result.html().contains(r#"alt="diagram alt""#));
    }

    #[test]
    fn test_frontmatter_is_not_searchable() {
        let markdown = indoc! {"
            ---
            title: Secret
            ---

            Body
        "};
        let result = render_markdown(markdown).unwrap();
        assert_eq!(texts(&result), vec!["Body"]);
    }

    #[test]
    fn test_placeholder_characters_in_source_are_replaced() {
        let result = render_markdown("odd \u{E000}0\u{E001} text").unwrap();
        assert_eq!(texts(&result), vec!["odd \u{FFFD}0\u{FFFD} text"]);
    }

    #[test]
    fn test_placeholder_characters_in_html_attribute_stay_markup() {
        let markdown = "<span title=\"\u{E000}0\u{E001}\">hello</span> world";
        let result = render_markdown(markdown).unwrap();

        let scrubbed = markdown.replace(['\u{E000}', '\u{E001}'], "\u{FFFD}");
        let mut expected = String::new();
        html::push_html(&mut expected, Parser::new_ext(&scrubbed, Options::all()));
        assert_eq!(result.html(), expected);
        assert_eq!(texts(&result), vec!["hello", " world"]);

        let matches = crate::search::find_matches(&result, "hello", false);
        let painted = crate::search::paint(&result, &matches, Some(0));
        assert!(painted.contains("title=\"\u{FFFD}0\u{FFFD}\""));
        assert!(painted.contains(">hello</mark></span>"));
    }

    #[test]
    fn test_decoded_placeholder_entities_stay_markup() {
        let markdown = indoc! {"
            [link](/a&#xE000;0&#xE001;.md \"&#xE000;1&#xE001;\")

            ```&#xE000;2&#xE001;
            code
            ```
        "};
        let result = render_markdown(markdown).unwrap();

        assert_eq!(texts(&result), vec!["link", "code\n"]);
        assert!(!result.html().contains(['\u{E000}', '\u{E001}']));
    }

    #[test]
    fn test_unknown_placeholder_stays_markup() {
        let segments = split_placeholders("<p>\u{E000}7\u{E001}</p>", vec!["x".to_string()]);
        assert_eq!(
            segments,
            vec![Segment::Markup("<p>\u{E000}7\u{E001}</p>".to_string())]
        );
    }

    #[test]
    fn test_render_markdown_empty_input() {
        let result = render_markdown("").unwrap();
        assert!(result.html().is_empty());
        assert!(result.segments().is_empty());
    }

    #[test]
    fn test_renderer_plain_text_for_non_markdown() {
        let result = MarkdownRenderer
            .render("# not a heading", Path::new("/notes/file.txt"))
            .unwrap();
        assert_eq!(
            result.html(),
            r#"<pre class="plain-text-viewer"># not a heading</pre>"#
        );
        assert_eq!(texts(&result), vec!["# not a heading"]);
    }

    #[test]
    fn test_renderer_markdown_extension() {
        let result = MarkdownRenderer
            .render("# Heading", Path::new("/notes/file.md"))
            .unwrap();
        assert!(result.html().contains("<h1>Heading</h1>"));
    }
}
