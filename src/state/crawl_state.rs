use crate::url::MediaKind;
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Locks a mutex, recovering the data if a worker panicked while holding it
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Four independent sets of normalized media URLs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaSets {
    pub images: HashSet<String>,
    pub vectors: HashSet<String>,
    pub videos: HashSet<String>,
    pub fonts: HashSet<String>,
}

impl MediaSets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the set holding URLs of the given kind
    pub fn get(&self, kind: MediaKind) -> &HashSet<String> {
        match kind {
            MediaKind::Image => &self.images,
            MediaKind::Vector => &self.vectors,
            MediaKind::Video => &self.videos,
            MediaKind::Font => &self.fonts,
        }
    }

    fn get_mut(&mut self, kind: MediaKind) -> &mut HashSet<String> {
        match kind {
            MediaKind::Image => &mut self.images,
            MediaKind::Vector => &mut self.vectors,
            MediaKind::Video => &mut self.videos,
            MediaKind::Font => &mut self.fonts,
        }
    }

    /// Inserts a URL into the set for `kind`; returns false if already present
    pub fn insert(&mut self, kind: MediaKind, url: String) -> bool {
        self.get_mut(kind).insert(url)
    }

    /// Merges every set of `other` into this one
    pub fn extend(&mut self, other: MediaSets) {
        self.images.extend(other.images);
        self.vectors.extend(other.vectors);
        self.videos.extend(other.videos);
        self.fonts.extend(other.fonts);
    }

    /// Number of URLs of the given kind
    pub fn count(&self, kind: MediaKind) -> usize {
        self.get(kind).len()
    }

    /// Number of URLs across all kinds
    pub fn total(&self) -> usize {
        MediaKind::ALL.iter().map(|kind| self.count(*kind)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Materializes the set for `kind` as a sorted list
    pub fn urls(&self, kind: MediaKind) -> Vec<String> {
        let mut urls: Vec<String> = self.get(kind).iter().cloned().collect();
        urls.sort();
        urls
    }
}

/// Media sets guarded by one lock per kind, shared by crawl workers
#[derive(Debug, Default)]
pub struct MediaAccumulator {
    images: Mutex<HashSet<String>>,
    vectors: Mutex<HashSet<String>>,
    videos: Mutex<HashSet<String>>,
    fonts: Mutex<HashSet<String>>,
}

impl MediaAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, kind: MediaKind) -> &Mutex<HashSet<String>> {
        match kind {
            MediaKind::Image => &self.images,
            MediaKind::Vector => &self.vectors,
            MediaKind::Video => &self.videos,
            MediaKind::Font => &self.fonts,
        }
    }

    /// Inserts one URL; returns false if it was already accumulated
    pub fn insert(&self, kind: MediaKind, url: String) -> bool {
        lock(self.slot(kind)).insert(url)
    }

    /// Merges a page's media, taking each kind's lock in turn
    pub fn merge(&self, media: MediaSets) {
        let MediaSets {
            images,
            vectors,
            videos,
            fonts,
        } = media;
        lock(&self.images).extend(images);
        lock(&self.vectors).extend(vectors);
        lock(&self.videos).extend(videos);
        lock(&self.fonts).extend(fonts);
    }

    pub fn count(&self, kind: MediaKind) -> usize {
        lock(self.slot(kind)).len()
    }

    /// Copies the current contents into plain sets
    pub fn snapshot(&self) -> MediaSets {
        MediaSets {
            images: lock(&self.images).clone(),
            vectors: lock(&self.vectors).clone(),
            videos: lock(&self.videos).clone(),
            fonts: lock(&self.fonts).clone(),
        }
    }
}

/// Shared state of one crawl invocation
///
/// Each logical set has its own lock:
/// - the visited set, so that no URL is claimed by two workers
/// - the media accumulator, one lock per kind
/// - the processed-page counter, whose check-then-increment is atomic with
///   respect to the page budget
/// - the stylesheets already scanned for fonts
#[derive(Debug)]
pub struct CrawlState {
    visited: Mutex<HashSet<String>>,
    stylesheets: Mutex<HashSet<String>>,
    media: MediaAccumulator,
    pages_processed: Mutex<usize>,
    max_pages: usize,
}

impl CrawlState {
    /// Creates empty state for a crawl limited to `max_pages` processed pages
    pub fn new(max_pages: usize) -> Self {
        Self {
            visited: Mutex::new(HashSet::new()),
            stylesheets: Mutex::new(HashSet::new()),
            media: MediaAccumulator::new(),
            pages_processed: Mutex::new(0),
            max_pages,
        }
    }

    /// Atomically claims a normalized URL for processing
    ///
    /// Returns true only for the first claimant of a URL.
    pub fn claim(&self, url: &str) -> bool {
        let mut visited = lock(&self.visited);
        if visited.contains(url) {
            return false;
        }
        visited.insert(url.to_string())
    }

    pub fn is_visited(&self, url: &str) -> bool {
        lock(&self.visited).contains(url)
    }

    pub fn visited_count(&self) -> usize {
        lock(&self.visited).len()
    }

    /// Claims a stylesheet URL for font scanning; true only the first time
    pub fn claim_stylesheet(&self, url: &str) -> bool {
        lock(&self.stylesheets).insert(url.to_string())
    }

    /// Counts one successfully fetched page against the budget
    ///
    /// Returns the new count, or None if the budget was already exhausted, in
    /// which case the page's results must be discarded.
    pub fn try_record_page(&self) -> Option<usize> {
        let mut processed = lock(&self.pages_processed);
        if *processed >= self.max_pages {
            return None;
        }
        *processed += 1;
        Some(*processed)
    }

    pub fn pages_processed(&self) -> usize {
        *lock(&self.pages_processed)
    }

    pub fn max_pages(&self) -> usize {
        self.max_pages
    }

    pub fn budget_exhausted(&self) -> bool {
        self.pages_processed() >= self.max_pages
    }

    pub fn media(&self) -> &MediaAccumulator {
        &self.media
    }
}
