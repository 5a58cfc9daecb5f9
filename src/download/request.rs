//! Download request parameters, per-URL outcomes and run totals

use crate::config::Config;
use crate::url::MediaKind;
use std::path::{Path, PathBuf};

/// Bytes per megabyte for size limits
pub const BYTES_PER_MB: f64 = 1_048_576.0;

/// Converts a megabyte limit into bytes
pub fn mb_to_bytes(mb: f64) -> u64 {
    (mb * BYTES_PER_MB) as u64
}

/// Parameters of one download batch
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    /// Folder that receives the files; created if absent
    pub destination: PathBuf,

    /// Media kind of every URL in the batch
    pub kind: MediaKind,

    /// Per-file size limit in bytes
    pub max_size_bytes: u64,

    /// Only URLs whose path extension is in this list are downloaded
    pub allowed_extensions: Option<Vec<String>>,

    /// Attempts per URL, at least one
    pub retry_count: u32,
}

impl DownloadRequest {
    /// Builds a request from configuration defaults
    ///
    /// The destination is `<base-dir>/<kind folder>` and the size limit is
    /// the video limit for videos.
    pub fn from_config(config: &Config, kind: MediaKind) -> Self {
        let destination = Path::new(&config.output.base_dir).join(kind.folder_name());
        Self {
            destination,
            kind,
            max_size_bytes: mb_to_bytes(config.download.max_size_mb_for(kind)),
            allowed_extensions: config.download.allowed_extensions.clone(),
            retry_count: config.download.retry_count,
        }
    }

    /// Whether a lowercase dotted extension passes the filter
    pub fn allows_extension(&self, extension: Option<&str>) -> bool {
        match &self.allowed_extensions {
            None => true,
            Some(allowed) => extension
                .map(|ext| allowed.iter().any(|a| a.eq_ignore_ascii_case(ext)))
                .unwrap_or(false),
        }
    }
}

/// Result of downloading a single URL
#[derive(Debug, Clone, PartialEq)]
pub enum DownloadOutcome {
    /// Saved to `path`; `replaced` if a file already existed there
    Downloaded {
        path: PathBuf,
        bytes: u64,
        replaced: bool,
    },

    /// Extension not in the allowed list; never requested
    Filtered,

    /// Declared or streamed size exceeded the limit; not retried
    SkippedTooLarge { size: u64, limit: u64 },

    /// Every attempt failed
    Failed { attempts: u32, error: String },
}

/// Totals of a download batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadSummary {
    pub successful: usize,
    pub replaced: usize,
    pub failed: usize,
    pub skipped: usize,
    pub filtered: usize,

    /// Absolute path of the destination folder
    pub destination: PathBuf,
}

impl DownloadSummary {
    pub fn new(destination: PathBuf) -> Self {
        Self {
            destination,
            ..Self::default()
        }
    }

    /// Adds one outcome to the totals
    pub fn record(&mut self, outcome: &DownloadOutcome) {
        match outcome {
            DownloadOutcome::Downloaded { replaced, .. } => {
                self.successful += 1;
                if *replaced {
                    self.replaced += 1;
                }
            }
            DownloadOutcome::Filtered => self.filtered += 1,
            DownloadOutcome::SkippedTooLarge { .. } => self.skipped += 1,
            DownloadOutcome::Failed { .. } => self.failed += 1,
        }
    }

    /// Number of URLs accounted for
    pub fn total(&self) -> usize {
        self.successful + self.failed + self.skipped + self.filtered
    }
}
