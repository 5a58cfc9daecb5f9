//! Output module for printing crawl and download results
//!
//! This module handles:
//! - Crawl reports with per-kind media counts
//! - Discovered URL listings
//! - Download and snapshot summaries

mod report;

pub use report::{
    format_media_counts, print_crawl_report, print_download_summary, print_snapshot_report,
    print_url_list,
};
