use std::path::Path;

/// Extensions offered by the open dialog and rendered as markdown
pub const MARKDOWN_EXTENSIONS: &[&str] = &["md", "markdown"];

/// Extensions the open dialog accepts (markdown plus plain text)
pub const OPENABLE_EXTENSIONS: &[&str] = &["md", "markdown", "txt"];

/// Check whether the path has a markdown extension (case-insensitive)
pub fn is_markdown_file(path: impl AsRef<Path>) -> bool {
    path.as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            MARKDOWN_EXTENSIONS
                .iter()
                .any(|candidate| ext.eq_ignore_ascii_case(candidate))
        })
        .unwrap_or(false)
}
