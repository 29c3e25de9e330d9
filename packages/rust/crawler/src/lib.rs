//! Breadth-first site crawler that saves each page as Markdown.
//!
//! This crate provides:
//! - [`normalize`] and [`filter`] — URL canonicalization and link admission
//! - [`Frontier`] — FIFO queue with an at-most-once visited set
//! - [`browser`] — the session abstraction and its Chromium / HTTP providers
//! - [`page`] — fetch, soft-404 detection, rendering and writing of one page
//! - [`Crawler`] — the orchestrator, reporting through an [`EventSink`]

pub mod browser;
pub mod engine;
pub mod events;
pub mod filename;
pub mod filter;
pub mod frontier;
pub mod links;
pub mod normalize;
pub mod page;

pub use browser::{
    BrowserSession, ChromiumProvider, HttpProvider, LaunchOptions, ProviderChain,
    SessionProvider, provider_chain,
};
pub use engine::{CrawlHandle, CrawlSummary, Crawler, DEFAULT_NAVIGATION_TIMEOUT};
pub use events::{EventReceiver, EventSink};
pub use filename::derive_filename;
pub use filter::{LinkFilter, domain_allowed, path_matches_any};
pub use frontier::Frontier;
pub use links::extract_links;
pub use normalize::{network_location, normalize, strip_query};
