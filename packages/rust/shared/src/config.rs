//! Application configuration for ContextPacker.
//!
//! User config lives at `~/.contextpacker/contextpacker.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ContextPackerError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "contextpacker.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".contextpacker";

/// Fallback user agent when the config lists none.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/138.0.0.0 Safari/537.36";

// ---------------------------------------------------------------------------
// Config structs (matching contextpacker.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Crawl policies.
    #[serde(default)]
    pub crawl_policies: CrawlPoliciesConfig,

    /// Browser session settings.
    #[serde(default)]
    pub browser: BrowserConfig,

    /// Selectable user-agent strings; the first one is used by default.
    #[serde(default = "default_user_agents")]
    pub user_agents: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            defaults: DefaultsConfig::default(),
            crawl_policies: CrawlPoliciesConfig::default(),
            browser: BrowserConfig::default(),
            user_agents: default_user_agents(),
        }
    }
}

impl AppConfig {
    /// The user agent used when none is given on the command line.
    pub fn default_user_agent(&self) -> &str {
        self.user_agents
            .first()
            .map(String::as_str)
            .unwrap_or(DEFAULT_USER_AGENT)
    }
}

fn default_user_agents() -> Vec<String> {
    vec![
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/138.0.0.0 Safari/537.36 Edg/138.0.3351.121".into(),
        DEFAULT_USER_AGENT.into(),
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:140.0) Gecko/20100101 Firefox/140.0".into(),
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:141.0) Gecko/20100101 Firefox/141.0".into(),
        "Mozilla/5.0 (Linux; Android 10; K) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/114.0.0.0 Safari/537.36".into(),
    ]
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Directory the Markdown files are written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Maximum number of pages saved per crawl.
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,

    /// Link hops followed from the start URL.
    #[serde(default = "default_crawl_depth")]
    pub crawl_depth: u32,

    /// Lower bound of the randomized pause between fetches.
    #[serde(default = "default_min_pause_ms")]
    pub min_pause_ms: u64,

    /// Upper bound of the randomized pause between fetches.
    #[serde(default = "default_max_pause_ms")]
    pub max_pause_ms: u64,

    /// Only follow links on the start URL's exact host.
    #[serde(default = "default_true")]
    pub stay_on_subdomain: bool,

    /// Drop `?query` suffixes from fetched URLs.
    #[serde(default = "default_true")]
    pub ignore_queries: bool,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            max_pages: default_max_pages(),
            crawl_depth: default_crawl_depth(),
            min_pause_ms: default_min_pause_ms(),
            max_pause_ms: default_max_pause_ms(),
            stay_on_subdomain: true,
            ignore_queries: true,
        }
    }
}

fn default_output_dir() -> String {
    "contextpacker-output".into()
}
fn default_max_pages() -> usize {
    5
}
fn default_crawl_depth() -> u32 {
    1
}
fn default_min_pause_ms() -> u64 {
    212
}
fn default_max_pause_ms() -> u64 {
    2200
}
fn default_true() -> bool {
    true
}

/// `[crawl_policies]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrawlPoliciesConfig {
    /// Path patterns a link must match (when non-empty).
    #[serde(default)]
    pub include_paths: Vec<String>,

    /// Path patterns that reject a link.
    #[serde(default)]
    pub exclude_paths: Vec<String>,
}

/// `[browser]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Session providers, tried in order until one starts.
    #[serde(default = "default_providers")]
    pub providers: Vec<String>,

    /// Per-navigation timeout.
    #[serde(default = "default_page_load_timeout")]
    pub page_load_timeout_secs: u64,

    /// Run the browser without a window.
    #[serde(default = "default_true")]
    pub headless: bool,

    /// Explicit browser executable, bypassing discovery.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executable: Option<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            providers: default_providers(),
            page_load_timeout_secs: default_page_load_timeout(),
            headless: true,
            executable: None,
        }
    }
}

fn default_providers() -> Vec<String> {
    vec!["chromium".into(), "http".into()]
}
fn default_page_load_timeout() -> u64 {
    15
}

// ---------------------------------------------------------------------------
// Crawl config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Settings for a single crawl invocation. Never mutated once the crawl starts.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// First page of the crawl (depth 0).
    pub start_url: String,
    /// Directory the Markdown files are written to.
    pub output_dir: PathBuf,
    /// Stop once this many pages have been saved.
    pub max_pages: usize,
    /// Lower bound of the pacing pause.
    pub min_pause: Duration,
    /// Upper bound of the pacing pause.
    pub max_pause: Duration,
    /// Link hops followed from the start URL; 0 fetches the start URL only.
    pub crawl_depth: u32,
    /// Only enqueue links whose host:port equals the start URL's.
    pub stay_on_subdomain: bool,
    /// Strip `?query` from the final URL of each fetched page.
    pub ignore_queries: bool,
    /// User agent presented by the browser session.
    pub user_agent: String,
    /// Patterns a link must match (when non-empty).
    pub include_paths: Vec<String>,
    /// Patterns that reject a link; checked before `include_paths`.
    pub exclude_paths: Vec<String>,
}

impl CrawlConfig {
    /// Build a crawl config for `start_url` from the persisted defaults.
    pub fn from_app_config(
        app: &AppConfig,
        start_url: impl Into<String>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            start_url: start_url.into(),
            output_dir: output_dir.into(),
            max_pages: app.defaults.max_pages,
            min_pause: Duration::from_millis(app.defaults.min_pause_ms),
            max_pause: Duration::from_millis(app.defaults.max_pause_ms),
            crawl_depth: app.defaults.crawl_depth,
            stay_on_subdomain: app.defaults.stay_on_subdomain,
            ignore_queries: app.defaults.ignore_queries,
            user_agent: app.default_user_agent().to_string(),
            include_paths: app.crawl_policies.include_paths.clone(),
            exclude_paths: app.crawl_policies.exclude_paths.clone(),
        }
    }

    /// Check the invariants a crawl relies on.
    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.start_url).map_err(|e| {
            ContextPackerError::validation(format!("invalid start URL '{}': {e}", self.start_url))
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ContextPackerError::validation(format!(
                "start URL must be http or https, got '{}'",
                url.scheme()
            )));
        }
        if self.max_pages == 0 {
            return Err(ContextPackerError::validation(
                "max_pages must be greater than 0",
            ));
        }
        if self.min_pause > self.max_pause {
            return Err(ContextPackerError::validation(format!(
                "min pause ({}ms) exceeds max pause ({}ms)",
                self.min_pause.as_millis(),
                self.max_pause.as_millis()
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.contextpacker/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ContextPackerError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.contextpacker/contextpacker.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ContextPackerError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        ContextPackerError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| ContextPackerError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| ContextPackerError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| ContextPackerError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
