//! Breadth-first frontier with an at-most-once visited set.

use std::collections::{HashSet, VecDeque};

use contextpacker_shared::CrawlTask;
use url::Url;

use crate::normalize::normalize;

/// FIFO queue of pending tasks plus every normalized URL ever accepted.
///
/// A URL is marked visited when it is enqueued, not when it is fetched, so a
/// link discovered from two parents is still queued only once.
#[derive(Debug, Default)]
pub struct Frontier {
    queue: VecDeque<CrawlTask>,
    visited: HashSet<String>,
}

impl Frontier {
    /// An empty frontier.
    pub fn new() -> Self {
        Self::default()
    }

    /// A frontier holding only the start URL at depth 0.
    ///
    /// The seed is stored in its parsed form, the same spelling discovered
    /// links get, so a page linking back to the start is not fetched twice.
    pub fn seeded(start_url: &str) -> Self {
        let seed = Url::parse(start_url)
            .map(String::from)
            .unwrap_or_else(|_| start_url.to_string());
        let mut frontier = Self::new();
        frontier.enqueue(seed, 0);
        frontier
    }

    /// Queue `url` at `depth` unless its normalized form was seen before.
    /// Returns whether the task was queued.
    pub fn enqueue(&mut self, url: impl Into<String>, depth: u32) -> bool {
        let url = url.into();
        if !self.visited.insert(normalize(&url)) {
            return false;
        }
        self.queue.push_back(CrawlTask { url, depth });
        true
    }

    /// Take the oldest pending task.
    pub fn dequeue(&mut self) -> Option<CrawlTask> {
        self.queue.pop_front()
    }

    /// Record a URL as seen without queueing it (e.g. a redirect target).
    pub fn mark_visited(&mut self, url: &str) -> bool {
        self.visited.insert(normalize(url))
    }

    pub fn is_visited(&self, url: &str) -> bool {
        self.visited.contains(&normalize(url))
    }

    /// Number of pending tasks.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }
}
