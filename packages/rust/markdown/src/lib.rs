//! HTML-to-Markdown rendering for crawled pages.
//!
//! Strips `<script>` and `<style>` subtrees from the parsed document, converts
//! the rest with the `htmd` crate, then applies a few cleanup passes.
//! Everything here is a pure transformation: HTML text in, Markdown text out.

mod cleanup;

use scraper::{Html, Selector};
use tracing::{debug, instrument};
use url::Url;

use contextpacker_shared::{ContextPackerError, Result};

/// Render a full HTML document as Markdown.
///
/// `base_url` is the page's own URL; when given, relative Markdown links are
/// rewritten to absolute ones.
#[instrument(skip(html), fields(len = html.len()))]
pub fn render(html: &str, base_url: Option<&Url>) -> Result<String> {
    let cleaned_html = strip_noise(html);

    let converter = htmd::HtmlToMarkdown::builder()
        .skip_tags(vec!["script", "style"])
        .build();

    let raw_markdown = converter
        .convert(&cleaned_html)
        .map_err(|e| ContextPackerError::Conversion(format!("htmd conversion failed: {e}")))?;

    debug!(raw_len = raw_markdown.len(), "htmd conversion complete");

    Ok(cleanup::run_pipeline(&raw_markdown, base_url))
}

/// Remove `<script>` and `<style>` elements, with everything beneath them.
pub fn strip_noise(html: &str) -> String {
    let mut doc = Html::parse_document(html);
    let Ok(noise) = Selector::parse("script, style") else {
        return doc.html();
    };

    let ids: Vec<_> = doc.select(&noise).map(|el| el.id()).collect();
    for id in ids {
        if let Some(mut node) = doc.tree.get_mut(id) {
            node.detach();
        }
    }

    doc.html()
}
