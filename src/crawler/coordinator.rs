//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl loop that ties the pieces together:
//! - Seeding the frontier with the start URL
//! - Dispatching claimed URLs to a fixed pool of worker tasks
//! - Feeding discovered links back into the frontier
//! - Detecting when the crawl has drained and collecting the results
//!
//! The frontier is owned by a single coordinator task. Workers only fetch and
//! extract; the visited set, page counter and media sets are shared through
//! [`CrawlState`].

use crate::config::{Config, CrawlerConfig};
use crate::crawler::extractor::{Extractor, PageExtraction};
use crate::crawler::fetcher::{build_http_client, fetch_text};
use crate::crawler::scheduler::{Dispatch, FrontierEntry, Scheduler};
use crate::state::{CrawlPhase, CrawlState, MediaSets};
use crate::url::{normalize_url, CrawlTarget, MediaClassifier, MediaKind};
use crate::WebberError;
use reqwest::Client;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use url::Url;

/// Results of a finished crawl
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// Normalized start URL
    pub start_url: String,

    /// Pages fetched successfully and counted against the budget
    pub pages_processed: usize,

    /// URLs claimed by the visited set, fetched or not
    pub pages_visited: usize,

    /// Media discovered across all processed pages
    pub media: MediaSets,

    /// Phase the crawl finished in
    pub phase: CrawlPhase,
}

impl CrawlReport {
    /// Sorted URLs of one media kind
    pub fn urls(&self, kind: MediaKind) -> Vec<String> {
        self.media.urls(kind)
    }
}

/// Finished page handed back from a worker to the coordinator
struct PageResult {
    entry: FrontierEntry,
    links: HashSet<String>,
}

/// Shared by every worker of one crawl
struct WorkerContext {
    client: Client,
    extractor: Extractor,
    state: Arc<CrawlState>,
    page_timeout: Duration,
}

/// Media crawler for a single website
#[derive(Debug, Clone)]
pub struct Crawler {
    client: Client,
    crawler: CrawlerConfig,
    classifier: MediaClassifier,
}

impl Crawler {
    /// Creates a new crawler with its own HTTP client
    ///
    /// # Arguments
    ///
    /// * `config` - The loaded configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Crawler)` - Ready to scan or crawl
    /// * `Err(WebberError)` - The HTTP client could not be built
    pub fn new(config: &Config) -> Result<Self, WebberError> {
        let client = build_http_client(&config.user_agent)?;
        Ok(Self::with_client(config, client))
    }

    /// Creates a crawler that shares an existing HTTP client
    pub fn with_client(config: &Config, client: Client) -> Self {
        Self {
            client,
            crawler: config.crawler.clone(),
            classifier: MediaClassifier::new(&config.media.vector_extensions),
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.crawler.page_timeout_secs)
    }

    fn extractor_for(&self, target: CrawlTarget) -> Extractor {
        Extractor::new(
            self.client.clone(),
            target,
            self.classifier.clone(),
            self.page_timeout(),
        )
    }

    /// Scans a single page for media without following links
    ///
    /// Unlike a crawl, a fetch failure here is returned to the caller.
    pub async fn scan_page(&self, url: &str) -> Result<PageExtraction, WebberError> {
        let target = CrawlTarget::from_url(url)?;
        let base_url = Url::parse(url)?;

        tracing::info!("Fetching page {}", url);
        let body = fetch_text(&self.client, url, self.page_timeout())
            .await
            .into_body(url)?;

        let page = self.extractor_for(target).extract(&body, &base_url).await;
        tracing::info!(
            "Found {} media URLs and {} links on {}",
            page.media.total(),
            page.links.len(),
            url
        );

        Ok(page)
    }

    /// Runs a bounded breadth-first crawl of the start URL's domain
    ///
    /// This method:
    /// 1. Seeds the frontier with the normalized start URL at depth 0
    /// 2. Spawns `concurrency` workers sharing one dispatch channel
    /// 3. Dispatches claimed URLs while workers and page budget allow
    /// 4. Enqueues links from each finished page at depth + 1
    /// 5. Stops once nothing is queued or in flight, or the budget is spent
    ///
    /// Individual page failures are logged and skipped; only an invalid start
    /// URL or a crashed worker fails the crawl.
    pub async fn crawl(&self, start_url: &str) -> Result<CrawlReport, WebberError> {
        let mut phase = CrawlPhase::Idle;

        let target = CrawlTarget::from_url(start_url)?;
        let start = normalize_url(start_url)?;

        let state = Arc::new(CrawlState::new(self.crawler.max_pages as usize));
        let concurrency = self.crawler.concurrency.max(1) as usize;

        let context = Arc::new(WorkerContext {
            client: self.client.clone(),
            extractor: self.extractor_for(target),
            state: Arc::clone(&state),
            page_timeout: self.page_timeout(),
        });

        // At most `concurrency` pages are in flight, so neither channel can fill
        let (job_tx, job_rx) = mpsc::channel::<FrontierEntry>(concurrency);
        let (result_tx, mut result_rx) = mpsc::channel::<PageResult>(concurrency);
        let job_rx = Arc::new(Mutex::new(job_rx));

        let mut workers = JoinSet::new();
        for worker_id in 0..concurrency {
            workers.spawn(run_worker(
                worker_id,
                Arc::clone(&context),
                Arc::clone(&job_rx),
                result_tx.clone(),
            ));
        }
        drop(result_tx);

        let mut scheduler = Scheduler::new(&self.crawler, Arc::clone(&state));
        scheduler.add_to_frontier(FrontierEntry::new(start.clone(), 0));

        phase = phase.transition(CrawlPhase::Running)?;
        tracing::info!(
            "Starting crawl from {} (max depth {}, max pages {}, {} workers)",
            start,
            self.crawler.max_depth,
            self.crawler.max_pages,
            concurrency
        );
        let start_time = Instant::now();

        loop {
            match scheduler.next_dispatch() {
                Dispatch::Fetch(entry) => {
                    tracing::debug!("Dispatching {} (depth {})", entry.url, entry.depth);
                    if job_tx.send(entry).await.is_err() {
                        tracing::error!("All crawl workers have stopped");
                        break;
                    }
                }
                Dispatch::Wait => match result_rx.recv().await {
                    Some(result) => {
                        scheduler.complete(&result.entry, result.links);
                        tracing::debug!(
                            "{} in frontier, {} in flight",
                            scheduler.frontier_size(),
                            scheduler.in_flight()
                        );
                    }
                    None => {
                        tracing::error!("All crawl workers have stopped");
                        break;
                    }
                },
                Dispatch::Drained => break,
            }
        }

        // Closing the dispatch channel lets idle workers exit
        drop(job_tx);
        while let Some(joined) = workers.join_next().await {
            joined?;
        }

        phase = phase.transition(CrawlPhase::Drained)?;

        let report = CrawlReport {
            start_url: start,
            pages_processed: state.pages_processed(),
            pages_visited: state.visited_count(),
            media: state.media().snapshot(),
            phase,
        };

        tracing::info!(
            "Crawl completed: {} pages processed, {} media URLs found in {:?}",
            report.pages_processed,
            report.media.total(),
            start_time.elapsed()
        );

        Ok(report)
    }

    /// Crawls and returns the sorted URLs of one media kind
    pub async fn crawl_for(&self, start_url: &str, kind: MediaKind) -> Result<Vec<String>, WebberError> {
        Ok(self.crawl(start_url).await?.urls(kind))
    }
}

/// Worker loop: takes entries off the shared dispatch channel until it closes
async fn run_worker(
    worker_id: usize,
    context: Arc<WorkerContext>,
    jobs: Arc<Mutex<mpsc::Receiver<FrontierEntry>>>,
    results: mpsc::Sender<PageResult>,
) {
    loop {
        let next = {
            let mut jobs = jobs.lock().await;
            jobs.recv().await
        };
        let Some(entry) = next else {
            break;
        };

        let links = process_entry(&context, &entry).await;
        if results.send(PageResult { entry, links }).await.is_err() {
            break;
        }
    }

    tracing::trace!("Worker {} finished", worker_id);
}

/// Fetches one page, records it and merges its media
///
/// Returns the page's same-domain links, or nothing if the page failed or
/// arrived after the budget was spent.
async fn process_entry(context: &WorkerContext, entry: &FrontierEntry) -> HashSet<String> {
    let body = match fetch_text(&context.client, &entry.url, context.page_timeout)
        .await
        .into_body(&entry.url)
    {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!("Error crawling {}: {}", entry.url, e);
            return HashSet::new();
        }
    };

    let Some(count) = context.state.try_record_page() else {
        tracing::debug!("Page budget reached, discarding {}", entry.url);
        return HashSet::new();
    };
    tracing::info!(
        "Crawling page {}/{}: {} (depth {})",
        count,
        context.state.max_pages(),
        entry.url,
        entry.depth
    );

    let base_url = match Url::parse(&entry.url) {
        Ok(url) => url,
        Err(e) => {
            tracing::warn!("Skipping unparseable URL {}: {}", entry.url, e);
            return HashSet::new();
        }
    };

    let page = context
        .extractor
        .extract_for_crawl(&body, &base_url, &context.state)
        .await;
    context.state.media().merge(page.media);

    page.links
}
