//! Plain HTTP fetching: no JavaScript, the page is whatever the server sends.

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::debug;

use contextpacker_shared::{ContextPackerError, Result};

use super::{BrowserSession, LaunchOptions, SessionProvider};

static TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("title").expect("valid title selector"));

/// Fallback provider built on `reqwest`. Always available.
#[derive(Debug, Clone, Default)]
pub struct HttpProvider;

impl HttpProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SessionProvider for HttpProvider {
    fn name(&self) -> &str {
        "HTTP"
    }

    async fn launch(&self, options: &LaunchOptions) -> Result<Box<dyn BrowserSession>> {
        let client = Client::builder()
            .user_agent(options.user_agent.as_str())
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| ContextPackerError::Browser(format!("failed to build HTTP client: {e}")))?;

        Ok(Box::new(HttpSession {
            client,
            loaded: None,
        }))
    }
}

struct LoadedPage {
    url: String,
    body: String,
}

struct HttpSession {
    client: Client,
    loaded: Option<LoadedPage>,
}

impl HttpSession {
    fn loaded(&self) -> Result<&LoadedPage> {
        self.loaded
            .as_ref()
            .ok_or_else(|| ContextPackerError::Browser("no page loaded".into()))
    }
}

#[async_trait]
impl BrowserSession for HttpSession {
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<()> {
        debug!(%url, "GET");
        let load = async {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| ContextPackerError::Browser(format!("{url}: {e}")))?;
            // Error statuses still carry a page; the title check decides.
            let final_url = response.url().to_string();
            let body = response
                .text()
                .await
                .map_err(|e| ContextPackerError::Browser(format!("{url}: body read failed: {e}")))?;
            Ok::<_, ContextPackerError>(LoadedPage {
                url: final_url,
                body,
            })
        };

        match tokio::time::timeout(timeout, load).await {
            Ok(page) => {
                self.loaded = Some(page?);
                Ok(())
            }
            Err(_) => Err(ContextPackerError::NavigationTimeout {
                url: url.to_string(),
                timeout,
            }),
        }
    }

    async fn current_url(&mut self) -> Result<String> {
        Ok(self.loaded()?.url.clone())
    }

    async fn page_source(&mut self) -> Result<String> {
        Ok(self.loaded()?.body.clone())
    }

    async fn title(&mut self) -> Result<String> {
        let doc = Html::parse_document(&self.loaded()?.body);
        Ok(doc
            .select(&TITLE)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .unwrap_or_default())
    }

    async fn close(&mut self) -> Result<()> {
        self.loaded = None;
        Ok(())
    }
}
