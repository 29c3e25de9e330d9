//! Core domain types shared between the crawl engine and its callers.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// CrawlTask
// ---------------------------------------------------------------------------

/// A discovered URL waiting in the frontier, tagged with its link distance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTask {
    /// URL as discovered (not normalized).
    pub url: String,
    /// Link hops from the start URL; the start URL is depth 0.
    pub depth: u32,
}

// ---------------------------------------------------------------------------
// SavedPageRecord
// ---------------------------------------------------------------------------

/// One successfully written page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedPageRecord {
    /// Final (possibly redirected) URL of the page.
    pub url: String,
    /// Full path of the written Markdown file.
    pub path: PathBuf,
    /// File name inside the output directory.
    pub filename: String,
    /// Running count of pages saved, including this one.
    pub pages_saved: usize,
    /// The crawl's page limit.
    pub max_pages: usize,
    /// Frontier size after this page's links were enqueued.
    pub queue_size: usize,
}

// ---------------------------------------------------------------------------
// CrawlEvent
// ---------------------------------------------------------------------------

/// How a crawl ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    Completed,
    Cancelled,
    Error,
}

impl std::fmt::Display for StatusKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Completed => write!(f, "completed"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Progress reported to the caller, in emission order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CrawlEvent {
    /// Human-readable progress line.
    Log { message: String },
    /// A page was written to disk.
    FileSaved(SavedPageRecord),
    /// Emitted before each fetch.
    Progress { value: usize, max_value: usize },
    /// Terminal event; exactly one per crawl.
    Status { kind: StatusKind, message: String },
}

impl CrawlEvent {
    /// Whether this event ends the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Status { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_type_tag() {
        let event = CrawlEvent::Progress {
            value: 2,
            max_value: 10,
        };
        let json = serde_json::to_value(&event).expect("serialize");
        assert_eq!(json["type"], "progress");
        assert_eq!(json["value"], 2);
        assert_eq!(json["max_value"], 10);
    }

    #[test]
    fn file_saved_flattens_record_fields() {
        let event = CrawlEvent::FileSaved(SavedPageRecord {
            url: "https://x.test/docs".into(),
            path: PathBuf::from("/tmp/out/docs.md"),
            filename: "docs.md".into(),
            pages_saved: 1,
            max_pages: 3,
            queue_size: 7,
        });
        let json = serde_json::to_value(&event).expect("serialize");
        assert_eq!(json["type"], "file_saved");
        assert_eq!(json["filename"], "docs.md");
        assert_eq!(json["queue_size"], 7);

        let parsed: CrawlEvent = serde_json::from_value(json).expect("deserialize");
        assert_eq!(parsed, event);
    }

    #[test]
    fn status_kind_is_snake_case() {
        let event = CrawlEvent::Status {
            kind: StatusKind::Cancelled,
            message: "Process cancelled by user.".into(),
        };
        let json = serde_json::to_string(&event).expect("serialize");
        assert!(json.contains(r#""kind":"cancelled""#));
        assert!(event.is_terminal());
    }
}
