//! Terminal rendering of crawl events.

use color_eyre::eyre::Result;
use contextpacker_shared::CrawlEvent;
use indicatif::{ProgressBar, ProgressStyle};

use crate::commands::EventFormat;

/// Prints events either above an indicatif bar or as JSON lines.
pub(crate) struct EventPrinter {
    format: EventFormat,
    bar: Option<ProgressBar>,
    status: Option<String>,
}

impl EventPrinter {
    pub(crate) fn new(format: EventFormat, max_pages: usize) -> Self {
        let bar = (format == EventFormat::Text).then(|| {
            let bar = ProgressBar::new(max_pages as u64);
            bar.set_style(
                ProgressStyle::with_template("{spinner:.cyan} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
                    .unwrap()
                    .progress_chars("=> "),
            );
            bar.enable_steady_tick(std::time::Duration::from_millis(80));
            bar
        });
        Self {
            format,
            bar,
            status: None,
        }
    }

    pub(crate) fn print(&mut self, event: &CrawlEvent) -> Result<()> {
        if let CrawlEvent::Status { message, .. } = event {
            self.status = Some(message.trim().to_string());
        }

        match self.format {
            EventFormat::Json => println!("{}", serde_json::to_string(event)?),
            EventFormat::Text => self.print_text(event),
        }
        Ok(())
    }

    fn print_text(&self, event: &CrawlEvent) {
        let Some(bar) = &self.bar else {
            return;
        };
        match event {
            CrawlEvent::Log { message } => bar.println(message),
            CrawlEvent::Progress { value, max_value } => {
                bar.set_length(*max_value as u64);
                bar.set_position(*value as u64);
            }
            CrawlEvent::FileSaved(record) => {
                bar.set_position(record.pages_saved as u64);
                bar.set_message(format!("{} (queue: {})", record.filename, record.queue_size));
            }
            CrawlEvent::Status { kind, message } => {
                bar.finish_and_clear();
                println!("[{kind}] {}", message.trim());
            }
        }
    }

    /// Out-of-band line from the CLI itself.
    pub(crate) fn note(&self, message: &str) {
        match &self.bar {
            Some(bar) => bar.println(message),
            None => eprintln!("{message}"),
        }
    }

    pub(crate) fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }

    /// Message of the terminal status, once seen.
    pub(crate) fn status_message(&self) -> Option<&str> {
        self.status.as_deref()
    }
}
