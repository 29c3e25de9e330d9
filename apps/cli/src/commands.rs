//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use contextpacker_crawler::{Crawler, ProviderChain, provider_chain};
use contextpacker_shared::{
    AppConfig, BrowserConfig, CrawlConfig, StatusKind, init_config, load_config,
};
use tracing::info;

use crate::progress::EventPrinter;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// ContextPacker — crawl a website into a folder of Markdown files.
#[derive(Parser)]
#[command(
    name = "contextpacker",
    version,
    about = "Crawl a website breadth-first and save every page as Markdown.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Crawl a site and write one Markdown file per page.
    Crawl(CrawlArgs),

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Flags for `contextpacker crawl`. Unset flags fall back to the config file.
#[derive(Args, Debug, Clone)]
pub(crate) struct CrawlArgs {
    /// Start URL (depth 0).
    pub url: String,

    /// Output directory for the Markdown files.
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Stop after this many saved pages.
    #[arg(long)]
    pub max_pages: Option<usize>,

    /// Link hops to follow from the start URL.
    #[arg(long)]
    pub depth: Option<u32>,

    /// Lower bound of the pause between pages, in milliseconds.
    #[arg(long)]
    pub min_pause_ms: Option<u64>,

    /// Upper bound of the pause between pages, in milliseconds.
    #[arg(long)]
    pub max_pause_ms: Option<u64>,

    /// Only follow links matching this pattern (repeatable).
    #[arg(long = "include")]
    pub include: Vec<String>,

    /// Never follow links matching this pattern (repeatable).
    #[arg(long = "exclude")]
    pub exclude: Vec<String>,

    /// Follow links to other hosts.
    #[arg(long)]
    pub allow_offsite: bool,

    /// Keep `?query` suffixes on fetched URLs.
    #[arg(long)]
    pub keep_queries: bool,

    /// User agent presented to the site.
    #[arg(long)]
    pub user_agent: Option<String>,

    /// Session provider to use.
    #[arg(long, default_value = "auto")]
    pub browser: BrowserChoice,

    /// Per-page navigation timeout in seconds.
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout_secs: Option<u64>,

    /// Show a browser window instead of running headless.
    #[arg(long)]
    pub headed: bool,

    /// Event output: progress bar (text) or one JSON object per line.
    #[arg(long, default_value = "text")]
    pub events: EventFormat,
}

/// Which session provider(s) to try.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub(crate) enum BrowserChoice {
    /// The `[browser] providers` list from the config file.
    Auto,
    Chromium,
    Http,
}

/// How crawl events are printed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub(crate) enum EventFormat {
    Text,
    Json,
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Diagnostics go to stderr so they
/// never interleave with JSON events on stdout.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "contextpacker=warn",
        1 => "contextpacker=info",
        2 => "contextpacker=debug",
        _ => "contextpacker=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Crawl(args) => cmd_crawl(args).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

async fn cmd_crawl(args: CrawlArgs) -> Result<()> {
    let app = load_config()?;
    let crawl_config = crawl_config(&app, &args);
    let providers = providers(&app.browser, args.browser)?;
    let timeout = navigation_timeout(&app, &args)?;

    info!(
        url = %crawl_config.start_url,
        out = %crawl_config.output_dir.display(),
        max_pages = crawl_config.max_pages,
        depth = crawl_config.crawl_depth,
        providers = ?providers.names(),
        "starting crawl"
    );

    let out_dir = crawl_config.output_dir.clone();
    let max_pages = crawl_config.max_pages;
    let crawler = Crawler::new(crawl_config, providers)?
        .with_navigation_timeout(timeout)
        .headless(app.browser.headless && !args.headed);

    let mut handle = crawler.spawn();
    let cancel = handle.cancel_token();
    let mut printer = EventPrinter::new(args.events, max_pages);
    let mut interrupted = false;

    loop {
        tokio::select! {
            event = handle.events.recv() => match event {
                Some(event) => printer.print(&event)?,
                None => break,
            },
            _ = tokio::signal::ctrl_c(), if !interrupted => {
                interrupted = true;
                printer.note("Cancelling... waiting for the current page to finish.");
                cancel.cancel();
            }
        }
    }

    let summary = handle
        .wait()
        .await
        .map_err(|e| eyre!("crawl task failed: {e}"))?;
    printer.finish();

    match summary.outcome {
        StatusKind::Error => Err(eyre!(
            "{}",
            printer
                .status_message()
                .unwrap_or("crawl failed before any page was fetched")
        )),
        StatusKind::Completed if args.events == EventFormat::Text => {
            println!();
            println!("  Pages saved: {}", summary.pages_saved);
            println!("  Output:      {}", out_dir.display());
            println!();
            Ok(())
        }
        _ => Ok(()),
    }
}

/// Merge the persisted defaults with command-line overrides.
/// Per-page budget from `--timeout-secs` or the config file. Zero is refused.
fn navigation_timeout(app: &AppConfig, args: &CrawlArgs) -> Result<Duration> {
    match args.timeout_secs.unwrap_or(app.browser.page_load_timeout_secs) {
        0 => Err(eyre!("page load timeout must be at least 1 second")),
        secs => Ok(Duration::from_secs(secs)),
    }
}

fn crawl_config(app: &AppConfig, args: &CrawlArgs) -> CrawlConfig {
    let out = args
        .out
        .clone()
        .unwrap_or_else(|| PathBuf::from(&app.defaults.output_dir));
    let mut config = CrawlConfig::from_app_config(app, args.url.clone(), out);

    if let Some(n) = args.max_pages {
        config.max_pages = n;
    }
    if let Some(depth) = args.depth {
        config.crawl_depth = depth;
    }
    if let Some(ms) = args.min_pause_ms {
        config.min_pause = Duration::from_millis(ms);
    }
    if let Some(ms) = args.max_pause_ms {
        config.max_pause = Duration::from_millis(ms);
    }
    if !args.include.is_empty() {
        config.include_paths = args.include.clone();
    }
    if !args.exclude.is_empty() {
        config.exclude_paths = args.exclude.clone();
    }
    if args.allow_offsite {
        config.stay_on_subdomain = false;
    }
    if args.keep_queries {
        config.ignore_queries = false;
    }
    if let Some(ua) = &args.user_agent {
        config.user_agent = ua.clone();
    }
    config
}

fn providers(browser: &BrowserConfig, choice: BrowserChoice) -> Result<ProviderChain> {
    let names = match choice {
        BrowserChoice::Auto => return Ok(provider_chain(browser)?),
        BrowserChoice::Chromium => vec!["chromium".to_string()],
        BrowserChoice::Http => vec!["http".to_string()],
    };
    let config = BrowserConfig {
        providers: names,
        ..browser.clone()
    };
    Ok(provider_chain(&config)?)
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> CrawlArgs {
        let cli = Cli::try_parse_from(argv).expect("valid arguments");
        match cli.command {
            Command::Crawl(args) => args,
            Command::Config { .. } => panic!("expected crawl"),
        }
    }

    #[test]
    fn defaults_come_from_app_config() {
        let args = parse(&["contextpacker", "crawl", "https://x.test/"]);
        let config = crawl_config(&AppConfig::default(), &args);

        assert_eq!(config.start_url, "https://x.test/");
        assert_eq!(config.output_dir, PathBuf::from("contextpacker-output"));
        assert_eq!(config.max_pages, 5);
        assert_eq!(config.crawl_depth, 1);
        assert!(config.stay_on_subdomain);
        assert!(config.ignore_queries);
        assert_eq!(args.browser, BrowserChoice::Auto);
        assert_eq!(args.events, EventFormat::Text);
    }

    #[test]
    fn flags_override_config() {
        let args = parse(&[
            "contextpacker",
            "crawl",
            "https://x.test/docs/",
            "--out",
            "/tmp/site",
            "--max-pages",
            "40",
            "--depth",
            "3",
            "--min-pause-ms",
            "0",
            "--max-pause-ms",
            "100",
            "--include",
            "/docs/",
            "--exclude",
            "/docs/legacy",
            "--exclude",
            "/blog",
            "--allow-offsite",
            "--keep-queries",
            "--user-agent",
            "custom-agent",
            "--browser",
            "http",
            "--events",
            "json",
        ]);
        let config = crawl_config(&AppConfig::default(), &args);

        assert_eq!(config.output_dir, PathBuf::from("/tmp/site"));
        assert_eq!(config.max_pages, 40);
        assert_eq!(config.crawl_depth, 3);
        assert_eq!(config.min_pause, Duration::ZERO);
        assert_eq!(config.max_pause, Duration::from_millis(100));
        assert_eq!(config.include_paths, vec!["/docs/".to_string()]);
        assert_eq!(config.exclude_paths.len(), 2);
        assert!(!config.stay_on_subdomain);
        assert!(!config.ignore_queries);
        assert_eq!(config.user_agent, "custom-agent");
        assert_eq!(args.events, EventFormat::Json);
    }

    #[test]
    fn browser_choice_selects_providers() {
        let browser = BrowserConfig::default();
        assert_eq!(
            providers(&browser, BrowserChoice::Auto).unwrap().names(),
            vec!["Chromium", "HTTP"]
        );
        assert_eq!(
            providers(&browser, BrowserChoice::Http).unwrap().names(),
            vec!["HTTP"]
        );
        assert_eq!(
            providers(&browser, BrowserChoice::Chromium).unwrap().names(),
            vec!["Chromium"]
        );
    }

    #[test]
    fn unknown_browser_choice_is_rejected() {
        assert!(
            Cli::try_parse_from(["contextpacker", "crawl", "https://x.test/", "--browser", "lynx"])
                .is_err()
        );
    }

    #[test]
    fn zero_timeout_flag_is_rejected() {
        assert!(
            Cli::try_parse_from(["contextpacker", "crawl", "https://x.test/", "--timeout-secs", "0"])
                .is_err()
        );
        let args = parse(&["contextpacker", "crawl", "https://x.test/", "--timeout-secs", "30"]);
        assert_eq!(
            navigation_timeout(&AppConfig::default(), &args).unwrap(),
            Duration::from_secs(30)
        );
    }

    #[test]
    fn zero_timeout_from_config_is_rejected() {
        let args = parse(&["contextpacker", "crawl", "https://x.test/"]);
        let mut app = AppConfig::default();
        assert_eq!(navigation_timeout(&app, &args).unwrap(), Duration::from_secs(15));

        app.browser.page_load_timeout_secs = 0;
        assert!(navigation_timeout(&app, &args).is_err());
    }
}
