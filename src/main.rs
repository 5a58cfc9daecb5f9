//! Webber main entry point
//!
//! This is the command-line interface for the Webber media downloader.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use webber::config::{load_config_or_default, validate, Config};
use webber::crawler::build_http_client;
use webber::output::{
    print_crawl_report, print_download_summary, print_snapshot_report, print_url_list,
};
use webber::{source, Crawler, DownloadRequest, Downloader, MediaKind, WebberError};

/// Webber: download images, vectors, videos and fonts from a website
///
/// Media is discovered on a single page or by crawling every page of the
/// start URL's domain up to a depth and page budget.
#[derive(Parser, Debug)]
#[command(name = "webber")]
#[command(version)]
#[command(about = "Website media and source downloader", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Download media found on a single page
    Page {
        /// Page URL
        url: String,

        #[command(flatten)]
        download: DownloadArgs,
    },

    /// Crawl the site and download media from every page reached
    Crawl {
        /// Start URL; only pages on its domain are followed
        url: String,

        /// Maximum link depth from the start page
        #[arg(long)]
        max_depth: Option<u32>,

        /// Maximum number of pages to process
        #[arg(long)]
        max_pages: Option<u32>,

        /// Number of pages fetched concurrently
        #[arg(long)]
        concurrency: Option<u32>,

        #[command(flatten)]
        download: DownloadArgs,
    },

    /// Save the page's HTML, stylesheets and scripts
    Code {
        /// Page URL
        url: String,

        /// Output folder (default: <base-dir>/code)
        #[arg(long, value_name = "DIR")]
        out: Option<PathBuf>,
    },
}

/// Flags shared by the media commands
#[derive(Args, Debug)]
struct DownloadArgs {
    /// Media kind: image, vector, video or font
    #[arg(short, long, default_value = "image")]
    kind: MediaKind,

    /// Destination folder (default: <base-dir>/<kind>s)
    #[arg(long, value_name = "DIR")]
    out: Option<PathBuf>,

    /// Per-file size limit in megabytes
    #[arg(long)]
    max_size_mb: Option<f64>,

    /// Only download these extensions (e.g. .png,.jpg)
    #[arg(long, value_delimiter = ',')]
    ext: Option<Vec<String>>,

    /// Attempts per file
    #[arg(long)]
    retries: Option<u32>,

    /// Print the discovered URLs instead of downloading
    #[arg(long)]
    list: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = load_config_or_default(cli.config.as_deref()).with_context(|| match &cli.config {
        Some(path) => format!("Failed to load configuration from {}", path.display()),
        None => "Invalid default configuration".to_string(),
    })?;
    if let Some(path) = &cli.config {
        tracing::info!("Configuration loaded from: {}", path.display());
    }

    let result = match cli.command {
        Command::Page { url, download } => handle_page(config, &url, download).await,
        Command::Crawl {
            url,
            max_depth,
            max_pages,
            concurrency,
            download,
        } => {
            let overrides = CrawlOverrides {
                max_depth,
                max_pages,
                concurrency,
            };
            handle_crawl(config, &url, overrides, download).await
        }
        Command::Code { url, out } => handle_code(&config, &url, out.as_deref()).await,
    };

    match result {
        Err(e) if matches!(
            e.downcast_ref::<WebberError>(),
            Some(WebberError::NothingFound { .. })
        ) => {
            println!("{}", e);
            Ok(())
        }
        other => other,
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("webber=info,warn"),
            1 => EnvFilter::new("webber=debug,info"),
            2 => EnvFilter::new("webber=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

struct CrawlOverrides {
    max_depth: Option<u32>,
    max_pages: Option<u32>,
    concurrency: Option<u32>,
}

/// Applies download flags to the configuration and re-validates it
fn apply_download_args(config: &mut Config, args: &DownloadArgs) -> anyhow::Result<()> {
    if let Some(mb) = args.max_size_mb {
        if args.kind.is_video() {
            config.download.video_max_size_mb = mb;
        } else {
            config.download.max_size_mb = mb;
        }
    }
    if let Some(ext) = &args.ext {
        config.download.allowed_extensions = Some(webber::config::normalize_extensions(ext));
    }
    if let Some(retries) = args.retries {
        config.download.retry_count = retries;
    }

    validate(config).context("Invalid command-line options")?;
    Ok(())
}

/// Handles the `page` command: scan one page and download its media
async fn handle_page(mut config: Config, url: &str, args: DownloadArgs) -> anyhow::Result<()> {
    apply_download_args(&mut config, &args)?;

    let client = build_http_client(&config.user_agent)?;
    let crawler = Crawler::with_client(&config, client.clone());

    println!("Fetching {}s from: {}", args.kind, url);
    let page = crawler
        .scan_page(url)
        .await
        .with_context(|| format!("Failed to retrieve webpage: {}", url))?;

    let urls = page.media.urls(args.kind);
    download_or_list(&config, client, url, urls, &args).await
}

/// Handles the `crawl` command: crawl the site and download its media
async fn handle_crawl(
    mut config: Config,
    url: &str,
    overrides: CrawlOverrides,
    args: DownloadArgs,
) -> anyhow::Result<()> {
    if let Some(depth) = overrides.max_depth {
        config.crawler.max_depth = depth;
    }
    if let Some(pages) = overrides.max_pages {
        config.crawler.max_pages = pages;
    }
    if let Some(concurrency) = overrides.concurrency {
        config.crawler.concurrency = concurrency;
    }
    apply_download_args(&mut config, &args)?;

    let client = build_http_client(&config.user_agent)?;
    let crawler = Crawler::with_client(&config, client.clone());

    println!("Starting crawl of {} for {}s", url, args.kind);
    let report = match crawler.crawl(url).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            return Err(e.into());
        }
    };
    print_crawl_report(&report);

    let urls = report.urls(args.kind);
    download_or_list(&config, client, url, urls, &args).await
}

/// Lists or downloads the URLs of the requested kind
async fn download_or_list(
    config: &Config,
    client: reqwest::Client,
    page_url: &str,
    urls: Vec<String>,
    args: &DownloadArgs,
) -> anyhow::Result<()> {
    if urls.is_empty() {
        return Err(WebberError::NothingFound {
            kind: args.kind.folder_name().to_string(),
            url: page_url.to_string(),
        }
        .into());
    }

    if args.list {
        print_url_list(args.kind, &urls);
        return Ok(());
    }

    let mut request = DownloadRequest::from_config(config, args.kind);
    if let Some(out) = &args.out {
        request.destination = out.clone();
    }

    println!("Found {} {}s. Starting download...", urls.len(), args.kind);
    let summary = Downloader::new(client, config)
        .download_all(&urls, &request)
        .await
        .with_context(|| format!("Cannot write to {}", request.destination.display()))?;
    print_download_summary(args.kind, &summary);

    Ok(())
}

/// Handles the `code` command: save the page source
async fn handle_code(config: &Config, url: &str, out: Option<&Path>) -> anyhow::Result<()> {
    let out_dir = match out {
        Some(dir) => dir.to_path_buf(),
        None => Path::new(&config.output.base_dir).join("code"),
    };

    let client = build_http_client(&config.user_agent)?;
    println!("Downloading source code from: {}", url);
    let report = source::snapshot(&client, url, &out_dir)
        .await
        .with_context(|| format!("Error downloading website code from {}", url))?;
    print_snapshot_report(&report);

    Ok(())
}
