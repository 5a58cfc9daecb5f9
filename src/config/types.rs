use crate::url::{MediaKind, DEFAULT_VECTOR_EXTENSIONS};
use serde::Deserialize;

/// Main configuration structure for Webber
///
/// Every section has defaults, so an empty file (or no file at all) is a
/// valid configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub download: DownloadConfig,
    pub media: MediaConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Maximum link depth from the start URL (the start page is depth 0)
    #[serde(rename = "max-depth")]
    pub max_depth: u32,

    /// Maximum number of pages successfully fetched per crawl
    #[serde(rename = "max-pages")]
    pub max_pages: u32,

    /// Number of crawl workers fetching pages concurrently
    pub concurrency: u32,

    /// Timeout for page and stylesheet fetches (seconds)
    #[serde(rename = "page-timeout-secs")]
    pub page_timeout_secs: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_depth: 3,
            max_pages: 100,
            concurrency: 5,
            page_timeout_secs: 10,
        }
    }
}

/// Media download configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// Attempts per URL before it is counted as failed
    #[serde(rename = "retry-count")]
    pub retry_count: u32,

    /// Size limit for non-video media (megabytes)
    #[serde(rename = "max-size-mb")]
    pub max_size_mb: f64,

    /// Size limit for videos (megabytes)
    #[serde(rename = "video-max-size-mb")]
    pub video_max_size_mb: f64,

    /// Only download URLs with one of these extensions (e.g. [".png", ".jpg"])
    #[serde(rename = "allowed-extensions")]
    pub allowed_extensions: Option<Vec<String>>,

    /// Per-request timeout for non-video media (seconds)
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Per-request timeout for videos (seconds)
    #[serde(rename = "video-timeout-secs")]
    pub video_timeout_secs: u64,

    /// Wait between attempts for non-video media (milliseconds)
    #[serde(rename = "retry-backoff-ms")]
    pub retry_backoff_ms: u64,

    /// Wait between attempts for videos (milliseconds)
    #[serde(rename = "video-retry-backoff-ms")]
    pub video_retry_backoff_ms: u64,
}

impl DownloadConfig {
    /// Size limit in megabytes for the given kind
    pub fn max_size_mb_for(&self, kind: MediaKind) -> f64 {
        if kind.is_video() {
            self.video_max_size_mb
        } else {
            self.max_size_mb
        }
    }
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            retry_count: 3,
            max_size_mb: 10.0,
            video_max_size_mb: 500.0,
            allowed_extensions: None,
            timeout_secs: 10,
            video_timeout_secs: 30,
            retry_backoff_ms: 1000,
            video_retry_backoff_ms: 2000,
        }
    }
}

/// Media classification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Extensions classified as vector graphics
    #[serde(rename = "vector-extensions")]
    pub vector_extensions: Vec<String>,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            vector_extensions: DEFAULT_VECTOR_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name sent in the User-Agent header
    pub name: String,

    /// Version sent in the User-Agent header
    pub version: String,
}

impl UserAgentConfig {
    /// Formats the User-Agent header value as `Name/Version`
    pub fn header_value(&self) -> String {
        format!("{}/{}", self.name, self.version)
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            name: "Webber".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory under which per-kind folders and the `code` folder are created
    #[serde(rename = "base-dir")]
    pub base_dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            base_dir: ".".to_string(),
        }
    }
}
