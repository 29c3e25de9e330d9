//! Browser-session abstraction and the ranked provider chain.
//!
//! The orchestrator only ever talks to a [`BrowserSession`]. Which runtime
//! backs it is decided once, at crawl start, by trying each
//! [`SessionProvider`] in order until one launches.

mod chromium;
mod http;

use std::time::Duration;

use async_trait::async_trait;

use contextpacker_shared::{BrowserConfig, ContextPackerError, Result};

use crate::events::EventSink;

pub use chromium::ChromiumProvider;
pub use http::HttpProvider;

/// Settings every provider receives at launch.
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    pub user_agent: String,
    pub headless: bool,
}

/// A live automation session. Owned by exactly one crawl worker.
#[async_trait]
pub trait BrowserSession: Send {
    /// Load `url`, failing with [`ContextPackerError::NavigationTimeout`]
    /// when it does not finish within `timeout`.
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<()>;

    /// URL of the loaded page after any redirects.
    async fn current_url(&mut self) -> Result<String>;

    async fn page_source(&mut self) -> Result<String>;

    async fn title(&mut self) -> Result<String>;

    /// Release the underlying runtime. Safe to call more than once.
    async fn close(&mut self) -> Result<()>;
}

/// Something that can start a [`BrowserSession`].
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Human-readable name used in log lines.
    fn name(&self) -> &str;

    async fn launch(&self, options: &LaunchOptions) -> Result<Box<dyn BrowserSession>>;
}

// ---------------------------------------------------------------------------
// ProviderChain
// ---------------------------------------------------------------------------

/// Ranked list of providers; the first one that launches wins.
#[derive(Default)]
pub struct ProviderChain {
    providers: Vec<Box<dyn SessionProvider>>,
}

impl std::fmt::Debug for ProviderChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.providers.iter().map(|p| p.name()))
            .finish()
    }
}

impl ProviderChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a provider at the lowest rank.
    pub fn with(mut self, provider: impl SessionProvider + 'static) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    pub fn names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Try each provider in order, logging every attempt to `events`.
    /// Returns `None` when none of them started.
    pub async fn acquire(
        &self,
        options: &LaunchOptions,
        events: &EventSink,
    ) -> Option<Box<dyn BrowserSession>> {
        events.log("Searching for a compatible web browser...");

        for provider in &self.providers {
            let name = provider.name();
            events.log(format!("  -> Attempting to initialize {name}..."));
            match provider.launch(options).await {
                Ok(session) => {
                    events.log(format!("✔ Success: Using {name} for web crawling."));
                    return Some(session);
                }
                Err(e) => {
                    events.log(format!(
                        "  -> {name} not found or failed to start. Details: {e}"
                    ));
                }
            }
        }

        None
    }
}

/// Build the chain named by `[browser] providers`.
pub fn provider_chain(config: &BrowserConfig) -> Result<ProviderChain> {
    let mut chain = ProviderChain::new();
    for name in &config.providers {
        chain = match name.as_str() {
            "chromium" => chain.with(ChromiumProvider::new(config.executable.clone())),
            "http" => chain.with(HttpProvider::new()),
            other => {
                return Err(ContextPackerError::config(format!(
                    "unknown browser provider '{other}' (expected 'chromium' or 'http')"
                )));
            }
        };
    }
    if chain.is_empty() {
        return Err(ContextPackerError::config("no browser providers configured"));
    }
    Ok(chain)
}

// ---------------------------------------------------------------------------
// Scripted sessions for tests
// ---------------------------------------------------------------------------
