//! Shared types, error model, and configuration for ContextPacker.
//!
//! This crate is the foundation depended on by all other ContextPacker crates.
//! It provides:
//! - [`ContextPackerError`] — the unified error type
//! - Domain types ([`CrawlTask`], [`SavedPageRecord`], [`CrawlEvent`])
//! - Configuration ([`AppConfig`], [`CrawlConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, BrowserConfig, CrawlConfig, CrawlPoliciesConfig, DEFAULT_USER_AGENT,
    DefaultsConfig, config_dir, config_file_path, init_config, load_config, load_config_from,
};
pub use error::{ContextPackerError, Result};
pub use types::{CrawlEvent, CrawlTask, SavedPageRecord, StatusKind};
