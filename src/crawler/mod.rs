//! Crawler module for page fetching and media discovery
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with per-request timeouts
//! - HTML and CSS media extraction
//! - Frontier scheduling with depth and page budgets
//! - Overall crawl coordination across a worker pool

mod coordinator;
mod extractor;
mod fetcher;
mod scheduler;

pub use coordinator::{CrawlReport, Crawler};
pub use extractor::{css_urls, extract_css_fonts, extract_media, Extractor, PageExtraction};
pub use fetcher::{build_http_client, fetch_text, FetchResult};
pub use scheduler::{Dispatch, FrontierEntry, Scheduler};

use crate::config::Config;
use crate::WebberError;

/// Runs a complete crawl operation
///
/// This is the main entry point for crawling a site. It will:
/// 1. Build the HTTP client from the user agent settings
/// 2. Crawl the start URL's domain breadth-first
/// 3. Return every media URL found, grouped by kind
///
/// # Arguments
///
/// * `config` - The loaded configuration
/// * `start_url` - Absolute http(s) URL to start from
///
/// # Returns
///
/// * `Ok(CrawlReport)` - Crawl drained, possibly with no media
/// * `Err(WebberError)` - Invalid start URL or a worker crashed
pub async fn crawl(config: &Config, start_url: &str) -> Result<CrawlReport, WebberError> {
    Crawler::new(config)?.crawl(start_url).await
}
