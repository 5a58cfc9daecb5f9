//! Scheduler for managing the crawl frontier
//!
//! This module handles:
//! - FIFO queue management for breadth-first traversal
//! - Pop-and-claim against the shared visited set
//! - Depth and page-budget admission
//! - Bounding the number of pages in flight to the worker count

use crate::config::CrawlerConfig;
use crate::state::CrawlState;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

/// A URL waiting in the frontier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierEntry {
    /// Normalized URL to fetch
    pub url: String,

    /// Link distance from the start URL
    pub depth: u32,
}

impl FrontierEntry {
    pub fn new(url: impl Into<String>, depth: u32) -> Self {
        Self {
            url: url.into(),
            depth,
        }
    }
}

/// What the coordinator should do next
#[derive(Debug, PartialEq, Eq)]
pub enum Dispatch {
    /// Hand this claimed entry to a worker
    Fetch(FrontierEntry),

    /// Wait for an in-flight page to complete before dispatching more
    Wait,

    /// Nothing is queued or in flight, or the budget is spent with nothing in flight
    Drained,
}

/// Scheduler manages the frontier queue and admission
///
/// The scheduler is owned by the coordinator task. Workers never touch the
/// frontier; they report back through the coordinator, which calls
/// [`Scheduler::complete`].
pub struct Scheduler {
    /// Frontier queue of entries to fetch, oldest first
    frontier: VecDeque<FrontierEntry>,

    /// Shared visited set and page counter
    state: Arc<CrawlState>,

    max_depth: u32,
    concurrency: usize,
    in_flight: usize,
}

impl Scheduler {
    /// Creates a new scheduler with an empty frontier
    pub fn new(config: &CrawlerConfig, state: Arc<CrawlState>) -> Self {
        Self {
            frontier: VecDeque::new(),
            state,
            max_depth: config.max_depth,
            concurrency: config.concurrency.max(1) as usize,
            in_flight: 0,
        }
    }

    /// Adds an entry to the back of the frontier
    pub fn add_to_frontier(&mut self, entry: FrontierEntry) {
        self.frontier.push_back(entry);
    }

    /// Decides the next coordinator action
    ///
    /// This method:
    /// 1. Stops dispatching once the page budget is spent (or fully reserved
    ///    by pages in flight) or every worker is busy
    /// 2. Pops entries, discarding those already claimed by the visited set
    /// 3. Drops entries deeper than the depth budget without fetching
    /// 4. Returns the first admitted entry
    pub fn next_dispatch(&mut self) -> Dispatch {
        loop {
            let processed = self.state.pages_processed();
            if processed >= self.state.max_pages() {
                return self.wait_or_drain();
            }

            if self.in_flight >= self.concurrency
                || processed + self.in_flight >= self.state.max_pages()
            {
                return Dispatch::Wait;
            }

            let Some(entry) = self.frontier.pop_front() else {
                return self.wait_or_drain();
            };

            if !self.state.claim(&entry.url) {
                tracing::trace!("Already visited: {}", entry.url);
                continue;
            }

            if entry.depth > self.max_depth {
                tracing::debug!(
                    "Dropping {} at depth {} (max {})",
                    entry.url,
                    entry.depth,
                    self.max_depth
                );
                continue;
            }

            self.in_flight += 1;
            return Dispatch::Fetch(entry);
        }
    }

    /// Records a finished page and enqueues its links at depth + 1
    ///
    /// Links already visited, or beyond the depth budget, are not enqueued.
    pub fn complete(&mut self, entry: &FrontierEntry, links: HashSet<String>) {
        self.in_flight = self.in_flight.saturating_sub(1);

        let depth = entry.depth + 1;
        if depth > self.max_depth {
            return;
        }

        for link in links {
            if !self.state.is_visited(&link) {
                self.frontier.push_back(FrontierEntry::new(link, depth));
            }
        }
    }

    fn wait_or_drain(&self) -> Dispatch {
        if self.in_flight == 0 {
            Dispatch::Drained
        } else {
            Dispatch::Wait
        }
    }

    /// Returns the number of entries in the frontier
    pub fn frontier_size(&self) -> usize {
        self.frontier.len()
    }

    /// Returns the number of dispatched pages not yet completed
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Returns whether the frontier is empty
    pub fn is_empty(&self) -> bool {
        self.frontier.is_empty()
    }
}
