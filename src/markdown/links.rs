use percent_encoding::percent_decode_str;
use std::path::{Path, PathBuf};

/// Where a link found in rendered content points to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkTarget {
    /// In-page anchor (`#section`)
    Anchor(String),
    /// URL with a scheme, handed to the external opener
    External(String),
    /// Local file, resolved against the document's directory
    Local(PathBuf),
}

/// Resolve an `href` from a document located in `base_dir`.
pub fn resolve_link(href: &str, base_dir: &Path) -> LinkTarget {
    let href = href.trim();

    if let Some(fragment) = href.strip_prefix('#') {
        return LinkTarget::Anchor(fragment.to_string());
    }

    if let Some(path) = href.strip_prefix("file://") {
        return LinkTarget::Local(PathBuf::from(decode_path(path)));
    }

    if has_scheme(href) {
        return LinkTarget::External(href.to_string());
    }

    // Drop query and fragment before touching the filesystem
    let path = href.split(['#', '?']).next().unwrap_or_default();
    let path = decode_path(path);
    let path = Path::new(&path);
    if path.is_absolute() {
        LinkTarget::Local(path.to_path_buf())
    } else {
        LinkTarget::Local(base_dir.join(path))
    }
}

fn decode_path(path: &str) -> String {
    percent_decode_str(path).decode_utf8_lossy().into_owned()
}

/// `scheme:` prefix per RFC 3986. Single letters are treated as Windows drives.
fn has_scheme(href: &str) -> bool {
    let Some((scheme, _)) = href.split_once(':') else {
        return false;
    };
    scheme.len() > 1
        && scheme.starts_with(|c: char| c.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}
