//! Headless Chromium over the DevTools protocol.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use contextpacker_shared::{ContextPackerError, Result};

use super::{BrowserSession, LaunchOptions, SessionProvider};

#[cfg(target_os = "windows")]
const INSTALL_PATHS: &[&str] = &[
    r"C:\Program Files\Google\Chrome\Application\chrome.exe",
    r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
    r"C:\Program Files\Chromium\Application\chrome.exe",
];

#[cfg(target_os = "macos")]
const INSTALL_PATHS: &[&str] = &[
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
    "/opt/homebrew/bin/chromium",
];

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
const INSTALL_PATHS: &[&str] = &[
    "/usr/bin/google-chrome",
    "/usr/bin/google-chrome-stable",
    "/usr/bin/chromium",
    "/usr/bin/chromium-browser",
    "/snap/bin/chromium",
    "/usr/local/bin/chromium",
    "/opt/google/chrome/chrome",
];

/// Launches a local Chrome/Chromium.
///
/// The executable comes from the config, then `CHROMIUM_PATH`, then the
/// usual install locations, then chromiumoxide's own discovery.
#[derive(Debug, Clone, Default)]
pub struct ChromiumProvider {
    executable: Option<String>,
}

impl ChromiumProvider {
    pub fn new(executable: Option<String>) -> Self {
        Self { executable }
    }

    fn executable(&self) -> Option<PathBuf> {
        if let Some(path) = &self.executable {
            return Some(PathBuf::from(path));
        }
        if let Ok(path) = std::env::var("CHROMIUM_PATH") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
            warn!(path = %path.display(), "CHROMIUM_PATH points to a missing file");
        }
        INSTALL_PATHS
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }
}

#[async_trait]
impl SessionProvider for ChromiumProvider {
    fn name(&self) -> &str {
        "Chromium"
    }

    async fn launch(&self, options: &LaunchOptions) -> Result<Box<dyn BrowserSession>> {
        let mut builder = BrowserConfig::builder()
            .arg(format!("--user-agent={}", options.user_agent))
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-extensions")
            .arg("--mute-audio");
        if let Some(path) = self.executable() {
            builder = builder.chrome_executable(path);
        }
        if !options.headless {
            builder = builder.with_head();
        }
        let config = builder.build().map_err(ContextPackerError::Browser)?;

        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| ContextPackerError::Browser(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    trace!(error = %e, "devtools handler error");
                }
            }
            debug!("devtools handler finished");
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                let _ = browser.close().await;
                handler.abort();
                return Err(ContextPackerError::Browser(e.to_string()));
            }
        };

        Ok(Box::new(ChromiumSession {
            browser,
            page,
            handler: Some(handler),
        }))
    }
}

struct ChromiumSession {
    browser: Browser,
    page: Page,
    handler: Option<JoinHandle<()>>,
}

fn cdp_error(e: impl std::fmt::Display) -> ContextPackerError {
    ContextPackerError::Browser(e.to_string())
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<()> {
        let load = async {
            self.page.goto(url).await.map_err(cdp_error)?;
            self.page.wait_for_navigation().await.map_err(cdp_error)?;
            Ok::<_, ContextPackerError>(())
        };
        match tokio::time::timeout(timeout, load).await {
            Ok(result) => result,
            Err(_) => Err(ContextPackerError::NavigationTimeout {
                url: url.to_string(),
                timeout,
            }),
        }
    }

    async fn current_url(&mut self) -> Result<String> {
        self.page
            .url()
            .await
            .map_err(cdp_error)?
            .ok_or_else(|| ContextPackerError::Browser("page has no URL".into()))
    }

    async fn page_source(&mut self) -> Result<String> {
        self.page.content().await.map_err(cdp_error)
    }

    async fn title(&mut self) -> Result<String> {
        self.page
            .evaluate("document.title")
            .await
            .map_err(cdp_error)?
            .into_value::<String>()
            .map_err(cdp_error)
    }

    async fn close(&mut self) -> Result<()> {
        let Some(handler) = self.handler.take() else {
            return Ok(());
        };
        let closed = self.browser.close().await.map_err(cdp_error);
        if closed.is_ok() {
            let _ = self.browser.wait().await;
        }
        handler.abort();
        closed.map(|_| ())
    }
}
