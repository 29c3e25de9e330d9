//! Anchor discovery in fetched page source.

use std::sync::LazyLock;

use scraper::{Html, Selector};
use url::Url;

static ANCHOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("valid anchor selector"));

/// Every `<a href>` in `html`, resolved against `base`, in document order.
///
/// In-page anchors, `mailto:` and `javascript:` links are skipped, as is
/// anything that does not resolve to http(s). Duplicates are kept; the
/// frontier deduplicates.
pub fn extract_links(html: &str, base: &Url) -> Vec<Url> {
    let doc = Html::parse_document(html);
    let mut links = Vec::new();

    for el in doc.select(&ANCHOR) {
        let Some(href) = el.value().attr("href") else {
            continue;
        };
        let href = href.trim();
        if href.is_empty()
            || href.starts_with('#')
            || href.starts_with("mailto:")
            || href.starts_with("javascript:")
        {
            continue;
        }

        match base.join(href) {
            Ok(resolved) if matches!(resolved.scheme(), "http" | "https") => links.push(resolved),
            Ok(_) => {}
            Err(e) => tracing::debug!(href, error = %e, "unresolvable link"),
        }
    }

    links
}
