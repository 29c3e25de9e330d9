//! Ordered, non-blocking event channel from the crawl worker to its caller.

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use contextpacker_shared::{CrawlEvent, SavedPageRecord, StatusKind};

/// Receiving half handed to the caller.
pub type EventReceiver = mpsc::UnboundedReceiver<CrawlEvent>;

/// Sending half owned by the crawl worker.
///
/// Every event is mirrored to `tracing`. Sends never block, and a caller
/// that dropped its receiver does not stop the crawl.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<CrawlEvent>,
}

impl EventSink {
    /// A connected sink/receiver pair.
    pub fn channel() -> (Self, EventReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn log(&self, message: impl Into<String>) {
        let message = message.into();
        info!(target: "contextpacker::crawl", "{message}");
        self.send(CrawlEvent::Log { message });
    }

    pub fn progress(&self, value: usize, max_value: usize) {
        debug!(value, max_value, "progress");
        self.send(CrawlEvent::Progress { value, max_value });
    }

    pub fn file_saved(&self, record: SavedPageRecord) {
        info!(
            url = %record.url,
            filename = %record.filename,
            pages_saved = record.pages_saved,
            queue_size = record.queue_size,
            "page saved"
        );
        self.send(CrawlEvent::FileSaved(record));
    }

    pub fn status(&self, kind: StatusKind, message: impl Into<String>) {
        let message = message.into();
        match kind {
            StatusKind::Completed => info!(%kind, "{message}"),
            StatusKind::Cancelled => warn!(%kind, "{message}"),
            StatusKind::Error => error!(%kind, "{message}"),
        }
        self.send(CrawlEvent::Status { kind, message });
    }

    fn send(&self, event: CrawlEvent) {
        // Receiver gone: the caller stopped listening, keep crawling.
        let _ = self.tx.send(event);
    }
}
