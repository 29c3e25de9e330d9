//! Filesystem-safe file names derived from page URLs.

use url::Url;

/// File name for the page at `normalized_url`.
///
/// The URL path becomes the name: `/guide/setup` → `guide-setup.md`, an empty
/// path or one ending in `/` gets `index`. Characters illegal on common
/// filesystems (`<>:"/\|?*`) become `_`.
///
/// Distinct URLs can map to the same name (`/a/b` and `/a-b`); the later
/// write replaces the earlier file.
pub fn derive_filename(normalized_url: &str) -> String {
    let mut path = Url::parse(normalized_url)
        .map(|u| u.path().to_string())
        .unwrap_or_default();

    if path.is_empty() || path.ends_with('/') {
        path.push_str("index");
    }

    let stem = path.strip_prefix('/').unwrap_or(&path).replace('/', "-");
    let stem = if stem.is_empty() { "index".to_string() } else { stem };

    let safe: String = stem
        .chars()
        .map(|c| if is_forbidden(c) { '_' } else { c })
        .collect();

    format!("{safe}.md")
}

fn is_forbidden(c: char) -> bool {
    matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*')
}
