//! Sequential, cancellable breadth-first crawl engine.
//!
//! One worker owns the browser session and the frontier for the whole crawl.
//! Pages are fetched one at a time with a randomized pause after each
//! navigation, and every step is reported through an [`EventSink`].

use std::time::Duration;

use rand::Rng;
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};
use url::Url;

use contextpacker_shared::{ContextPackerError, CrawlConfig, CrawlTask, Result, SavedPageRecord, StatusKind};

use crate::browser::{BrowserSession, LaunchOptions, ProviderChain};
use crate::events::{EventReceiver, EventSink};
use crate::filter::LinkFilter;
use crate::frontier::Frontier;
use crate::links::extract_links;
use crate::normalize::{normalize, strip_query};
use crate::page::{self, FetchedPage};

/// Per-navigation time budget unless overridden.
pub const DEFAULT_NAVIGATION_TIMEOUT: Duration = Duration::from_secs(15);

/// How long cleanup waits for the browser to shut down.
pub const SESSION_CLOSE_TIMEOUT: Duration = Duration::from_secs(10);

const NO_BROWSER_MESSAGE: &str = "Could not find a compatible web browser or its driver. \
Please ensure a supported browser (Chrome or Chromium) is installed, or enable the http provider.";

// ---------------------------------------------------------------------------
// CrawlSummary / CrawlHandle
// ---------------------------------------------------------------------------

/// How a crawl ended. Mirrors the terminal `Status` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlSummary {
    pub outcome: StatusKind,
    pub pages_saved: usize,
}

/// A crawl running on its own task.
#[derive(Debug)]
pub struct CrawlHandle {
    /// Ordered events; ends after the terminal `Status`.
    pub events: EventReceiver,
    cancel: CancellationToken,
    join: JoinHandle<CrawlSummary>,
}

impl CrawlHandle {
    /// Ask the crawl to stop at its next suspension point.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// A clone of the crawl's cancellation token.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Wait for the worker to finish.
    pub async fn wait(self) -> std::result::Result<CrawlSummary, JoinError> {
        self.join.await
    }
}

// ---------------------------------------------------------------------------
// Crawler
// ---------------------------------------------------------------------------

/// Outcome of one frontier task.
enum Visit {
    Saved {
        url: String,
        path: std::path::PathBuf,
        filename: String,
    },
    Skipped,
    /// Cancellation arrived during the pacing pause.
    Interrupted,
}

/// A configured crawl, ready to run once.
#[derive(Debug)]
pub struct Crawler {
    config: CrawlConfig,
    filter: LinkFilter,
    providers: ProviderChain,
    headless: bool,
    navigation_timeout: Duration,
    close_timeout: Duration,
}

impl Crawler {
    /// Validate `config` and bind it to a provider chain.
    pub fn new(config: CrawlConfig, providers: ProviderChain) -> Result<Self> {
        config.validate()?;
        if providers.is_empty() {
            return Err(ContextPackerError::config("no browser providers configured"));
        }
        Ok(Self {
            filter: LinkFilter::new(&config),
            config,
            providers,
            headless: true,
            navigation_timeout: DEFAULT_NAVIGATION_TIMEOUT,
            close_timeout: SESSION_CLOSE_TIMEOUT,
        })
    }

    pub fn with_navigation_timeout(mut self, timeout: Duration) -> Self {
        self.navigation_timeout = timeout;
        self
    }

    pub fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    pub fn with_close_timeout(mut self, timeout: Duration) -> Self {
        self.close_timeout = timeout;
        self
    }

    /// Run the crawl on a new tokio task.
    pub fn spawn(self) -> CrawlHandle {
        let (events, rx) = EventSink::channel();
        let cancel = CancellationToken::new();
        let join = tokio::spawn(self.run(events, cancel.clone()));
        CrawlHandle {
            events: rx,
            cancel,
            join,
        }
    }

    /// Run the crawl to completion on the current task.
    ///
    /// Emits exactly one `Status` event, always last. Only failing to start
    /// any browser session ends in `Error`; page failures are logged and
    /// skipped.
    #[instrument(skip_all, fields(start_url = %self.config.start_url, max_pages = self.config.max_pages, depth = self.config.crawl_depth))]
    pub async fn run(self, events: EventSink, cancel: CancellationToken) -> CrawlSummary {
        let options = LaunchOptions {
            user_agent: self.config.user_agent.clone(),
            headless: self.headless,
        };

        let Some(mut session) = self.providers.acquire(&options, &events).await else {
            events.status(StatusKind::Error, NO_BROWSER_MESSAGE);
            return CrawlSummary {
                outcome: StatusKind::Error,
                pages_saved: 0,
            };
        };

        if let Err(e) = tokio::fs::create_dir_all(&self.config.output_dir).await {
            events.log(format!(
                "  -> Could not create output directory {}: {e}",
                self.config.output_dir.display()
            ));
        }

        info!("starting crawl");
        events.log("Starting web crawl...");
        let (outcome, pages_saved) = self.crawl(session.as_mut(), &events, &cancel).await;

        events.log("Cleaning up browser driver...");
        match tokio::time::timeout(self.close_timeout, session.close()).await {
            Ok(Ok(())) => events.log("Browser driver cleaned up successfully."),
            Ok(Err(e)) => {
                warn!(error = %e, "session close failed");
                events.log(format!("Warning during driver cleanup: {e}"));
            }
            Err(_) => {
                warn!(timeout = ?self.close_timeout, "session close timed out");
                events.log(format!(
                    "Warning during driver cleanup: browser did not shut down within {:?}",
                    self.close_timeout
                ));
            }
        }

        match outcome {
            StatusKind::Cancelled => events.status(outcome, "Process cancelled by user."),
            _ => events.status(
                outcome,
                format!("Web scrape finished. Saved {pages_saved} pages."),
            ),
        }

        CrawlSummary {
            outcome,
            pages_saved,
        }
    }

    /// The running loop. Returns `Completed` or `Cancelled` and the count.
    async fn crawl(
        &self,
        session: &mut dyn BrowserSession,
        events: &EventSink,
        cancel: &CancellationToken,
    ) -> (StatusKind, usize) {
        let max_pages = self.config.max_pages;
        let mut frontier = Frontier::seeded(&self.config.start_url);
        let mut pages_saved = 0;

        loop {
            if cancel.is_cancelled() {
                return (StatusKind::Cancelled, pages_saved);
            }
            if pages_saved >= max_pages {
                break;
            }
            let Some(task) = frontier.dequeue() else {
                break;
            };

            events.progress(pages_saved, max_pages);
            events.log(format!("GET (Depth {}): {}", task.depth, task.url));

            match self.visit(session, &task, &mut frontier, events, cancel).await {
                Ok(Visit::Saved {
                    url,
                    path,
                    filename,
                }) => {
                    pages_saved += 1;
                    events.file_saved(SavedPageRecord {
                        url,
                        path,
                        filename,
                        pages_saved,
                        max_pages,
                        queue_size: frontier.len(),
                    });
                }
                Ok(Visit::Skipped | Visit::Interrupted) => {}
                Err(e) => events.log(describe_failure(&task.url, &e)),
            }
        }

        (StatusKind::Completed, pages_saved)
    }

    /// Fetch, pace, save and expand one task.
    async fn visit(
        &self,
        session: &mut dyn BrowserSession,
        task: &CrawlTask,
        frontier: &mut Frontier,
        events: &EventSink,
        cancel: &CancellationToken,
    ) -> Result<Visit> {
        let FetchedPage {
            html,
            final_url,
            title,
        } = page::fetch(session, &task.url, self.navigation_timeout).await?;

        if self.pace(cancel).await {
            return Ok(Visit::Interrupted);
        }

        let final_url = if self.config.ignore_queries {
            strip_query(&final_url).to_string()
        } else {
            final_url
        };
        let normalized = normalize(&final_url);
        frontier.mark_visited(&normalized);

        if page::is_not_found(&title) {
            events.log(format!("  -> Skipping (404 Not Found): {final_url}"));
            return Ok(Visit::Skipped);
        }

        let rendered = page::render_page(&html, &normalized)?;
        let path = page::write_page(&self.config.output_dir, &rendered).await?;

        if task.depth < self.config.crawl_depth {
            self.enqueue_links(&html, &final_url, task.depth, frontier);
        }

        Ok(Visit::Saved {
            url: final_url,
            path,
            filename: rendered.filename,
        })
    }

    fn enqueue_links(&self, html: &str, base: &str, depth: u32, frontier: &mut Frontier) {
        let Ok(base) = Url::parse(base) else {
            warn!(%base, "page URL does not parse, links not followed");
            return;
        };
        for link in extract_links(html, &base) {
            if self.filter.should_enqueue(link.as_str(), depth, frontier) {
                frontier.enqueue(link.as_str(), depth + 1);
            }
        }
    }

    /// Sleep for the pacing interval, waking early on cancellation.
    /// Returns whether the crawl was cancelled.
    async fn pace(&self, cancel: &CancellationToken) -> bool {
        let delay = pacing_delay(self.config.min_pause, self.config.max_pause);
        tokio::select! {
            _ = cancel.cancelled() => {}
            _ = tokio::time::sleep(delay) => {}
        }
        cancel.is_cancelled()
    }
}

/// Uniform draw from `[min, max]`.
fn pacing_delay(min: Duration, max: Duration) -> Duration {
    if min >= max {
        return min;
    }
    let secs = rand::rng().random_range(min.as_secs_f64()..=max.as_secs_f64());
    Duration::from_secs_f64(secs)
}

/// Log line for a page that failed without ending the crawl.
fn describe_failure(url: &str, err: &ContextPackerError) -> String {
    match err {
        ContextPackerError::NavigationTimeout { timeout, .. } => {
            format!("  -> TIMEOUT after {}s on: {url}", timeout.as_secs())
        }
        ContextPackerError::Browser(msg) => format!("  -> BROWSER ERROR on {url}: {msg}"),
        other => format!("  -> PROCESSING ERROR on {url}: {other}"),
    }
}
