//! Console reports for crawls, downloads and snapshots

use crate::crawler::CrawlReport;
use crate::download::DownloadSummary;
use crate::source::SnapshotReport;
use crate::state::MediaSets;
use crate::url::MediaKind;
use std::fmt::Write;

/// Formats per-kind media counts, one line per kind
pub fn format_media_counts(media: &MediaSets) -> String {
    let mut out = String::new();
    for kind in MediaKind::ALL {
        let _ = writeln!(out, "  {}: {}", kind.folder_name(), media.count(kind));
    }
    out
}

/// Prints a crawl report to stdout
///
/// # Arguments
///
/// * `report` - The finished crawl
pub fn print_crawl_report(report: &CrawlReport) {
    println!("=== Crawl Report ===\n");

    println!("Overview:");
    println!("  Start URL: {}", report.start_url);
    println!("  Pages processed: {}", report.pages_processed);
    println!("  URLs visited: {}", report.pages_visited);
    println!("  Final phase: {}", report.phase);
    println!();

    println!("Media found ({} total):", report.media.total());
    print!("{}", format_media_counts(&report.media));
    println!();
}

/// Prints discovered URLs of one kind, one per line
pub fn print_url_list(kind: MediaKind, urls: &[String]) {
    println!("Found {} {} URLs:", urls.len(), kind);
    for url in urls {
        println!("  {}", url);
    }
}

/// Prints the totals of a download batch
pub fn print_download_summary(kind: MediaKind, summary: &DownloadSummary) {
    println!("\nDownload complete!");
    println!("Successfully downloaded: {} {}", summary.successful, kind.folder_name());
    println!("Replaced existing files: {}", summary.replaced);
    println!("Failed downloads: {}", summary.failed);
    if summary.skipped > 0 {
        println!("Skipped (too large): {}", summary.skipped);
    }
    if summary.filtered > 0 {
        println!("Filtered by extension: {}", summary.filtered);
    }
    if summary.successful > 0 {
        println!("Files saved in: {}", summary.destination.display());
    }
}

/// Prints what a source snapshot wrote
pub fn print_snapshot_report(report: &SnapshotReport) {
    println!("\nWebsite code downloaded successfully!");
    println!("  Stylesheets: {}", report.stylesheets);
    println!("  Scripts: {}", report.scripts);
    if report.failed > 0 {
        println!("  Failed assets: {}", report.failed);
    }
    println!("Source code saved in: {}", report.root.display());
}
