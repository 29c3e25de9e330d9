//! One page: navigate, read back, render to Markdown, write.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, instrument};
use url::Url;

use contextpacker_shared::{ContextPackerError, Result};

use crate::browser::BrowserSession;
use crate::filename::derive_filename;

/// What the session reported after a navigation.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub html: String,
    /// URL after redirects, exactly as the session reports it.
    pub final_url: String,
    pub title: String,
}

/// A page converted and ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    pub filename: String,
    pub markdown: String,
}

/// Navigate to `url` and read back the final URL, source and title.
pub async fn fetch(
    session: &mut dyn BrowserSession,
    url: &str,
    timeout: Duration,
) -> Result<FetchedPage> {
    session.navigate(url, timeout).await?;
    let final_url = session.current_url().await?;
    let html = session.page_source().await?;
    let title = session.title().await?;
    debug!(%url, %final_url, %title, bytes = html.len(), "page loaded");
    Ok(FetchedPage {
        html,
        final_url,
        title,
    })
}

/// Soft-404 detection on the document title (case-sensitive).
pub fn is_not_found(title: &str) -> bool {
    title.contains("404") || title.contains("Not Found")
}

/// Convert `html` to Markdown and pick its file name from `normalized_url`.
#[instrument(skip_all, fields(url = %normalized_url))]
pub fn render_page(html: &str, normalized_url: &str) -> Result<RenderedPage> {
    let base = Url::parse(normalized_url).ok();
    let markdown = contextpacker_markdown::render(html, base.as_ref())?;
    Ok(RenderedPage {
        filename: derive_filename(normalized_url),
        markdown,
    })
}

/// Write `page` into `output_dir`, replacing any file of the same name.
pub async fn write_page(output_dir: &Path, page: &RenderedPage) -> Result<PathBuf> {
    let path = output_dir.join(&page.filename);
    tokio::fs::write(&path, page.markdown.as_bytes())
        .await
        .map_err(|e| ContextPackerError::io(&path, e))?;
    Ok(path)
}
