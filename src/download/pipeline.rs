//! Sequential fetch-and-persist pipeline
//!
//! Each URL goes through:
//! 1. The extension filter
//! 2. Filename generation and collision detection
//! 3. Up to `retry_count` streamed GET attempts with a fixed backoff
//! 4. Size enforcement from `Content-Length` and while streaming
//!
//! Bodies are streamed into a `.part` file next to the destination and
//! renamed into place only once complete, so a failed download never leaves a
//! truncated file behind.

use crate::config::{Config, DownloadConfig};
use crate::download::filename::safe_filename;
use crate::download::request::{DownloadOutcome, DownloadRequest, DownloadSummary};
use crate::url::{path_extension, MediaClassifier};
use crate::WebberError;
use reqwest::Client;
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use url::Url;

/// Result of one successful exchange with the server
enum Transfer {
    Complete { bytes: u64 },
    TooLarge { size: u64 },
}

/// Downloads media URLs one after another
#[derive(Debug, Clone)]
pub struct Downloader {
    client: Client,
    config: DownloadConfig,
    classifier: MediaClassifier,
}

impl Downloader {
    /// Creates a downloader sharing the crawl's HTTP client
    pub fn new(client: Client, config: &Config) -> Self {
        Self {
            client,
            config: config.download.clone(),
            classifier: MediaClassifier::new(&config.media.vector_extensions),
        }
    }

    /// Downloads every URL into the request's destination folder
    ///
    /// Per-URL failures are counted, never returned. The only error is a
    /// destination folder that cannot be created.
    ///
    /// # Arguments
    ///
    /// * `urls` - Absolute media URLs, all of the request's kind
    /// * `request` - Destination, size limit, filter and retry settings
    ///
    /// # Returns
    ///
    /// * `Ok(DownloadSummary)` - Totals and the absolute destination path
    /// * `Err(WebberError)` - The destination folder could not be created
    pub async fn download_all(
        &self,
        urls: &[String],
        request: &DownloadRequest,
    ) -> Result<DownloadSummary, WebberError> {
        tokio::fs::create_dir_all(&request.destination).await?;
        let destination = std::path::absolute(&request.destination)?;

        let mut summary = DownloadSummary::new(destination);
        tracing::info!(
            "Downloading {} {} URLs into {}",
            urls.len(),
            request.kind,
            summary.destination.display()
        );

        for (index, url) in urls.iter().enumerate() {
            let outcome = self.download_one(url, request).await;
            match &outcome {
                DownloadOutcome::Downloaded { path, bytes, .. } => {
                    tracing::info!(
                        "Downloaded {}/{}: {} ({} bytes) -> {}",
                        index + 1,
                        urls.len(),
                        url,
                        bytes,
                        path.display()
                    );
                }
                DownloadOutcome::Filtered => {
                    tracing::debug!("Filtered by extension: {}", url);
                }
                DownloadOutcome::SkippedTooLarge { size, limit } => {
                    tracing::warn!(
                        "Skipped {}: size {} bytes exceeds limit of {} bytes",
                        url,
                        size,
                        limit
                    );
                }
                DownloadOutcome::Failed { attempts, error } => {
                    tracing::warn!(
                        "Failed to download {} after {} attempts: {}",
                        url,
                        attempts,
                        error
                    );
                }
            }
            summary.record(&outcome);
        }

        Ok(summary)
    }

    /// Downloads a single URL, retrying transport and status failures
    ///
    /// The destination folder is created on first write if it is missing.
    pub async fn download_one(&self, url: &str, request: &DownloadRequest) -> DownloadOutcome {
        let extension = Url::parse(url)
            .ok()
            .and_then(|parsed| path_extension(parsed.path()));
        if !request.allows_extension(extension.as_deref()) {
            return DownloadOutcome::Filtered;
        }

        let filename = safe_filename(url, request.kind, &self.classifier);
        let path = request.destination.join(&filename);
        let part_path = request.destination.join(format!("{}.part", filename));

        let (timeout, backoff) = self.limits_for(request);
        let attempts = request.retry_count.max(1);
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            let result = self
                .transfer(url, &part_path, request.max_size_bytes, timeout)
                .await;

            match result {
                Ok(Transfer::Complete { bytes }) => {
                    let replaced = tokio::fs::try_exists(&path).await.unwrap_or(false);
                    if let Err(e) = tokio::fs::rename(&part_path, &path).await {
                        discard_partial(&part_path).await;
                        return DownloadOutcome::Failed {
                            attempts: attempt,
                            error: e.to_string(),
                        };
                    }
                    return DownloadOutcome::Downloaded {
                        path,
                        bytes,
                        replaced,
                    };
                }
                Ok(Transfer::TooLarge { size }) => {
                    discard_partial(&part_path).await;
                    return DownloadOutcome::SkippedTooLarge {
                        size,
                        limit: request.max_size_bytes,
                    };
                }
                Err(WebberError::Io(e)) => {
                    discard_partial(&part_path).await;
                    return DownloadOutcome::Failed {
                        attempts: attempt,
                        error: e.to_string(),
                    };
                }
                Err(e) => {
                    discard_partial(&part_path).await;
                    last_error = e.to_string();
                    if attempt < attempts {
                        tracing::debug!(
                            "Attempt {}/{} for {} failed: {}",
                            attempt,
                            attempts,
                            url,
                            e
                        );
                        tokio::time::sleep(backoff).await;
                    }
                }
            }
        }

        DownloadOutcome::Failed {
            attempts,
            error: last_error,
        }
    }

    /// Per-request timeout and retry backoff; both are longer for videos
    fn limits_for(&self, request: &DownloadRequest) -> (Duration, Duration) {
        if request.kind.is_video() {
            (
                Duration::from_secs(self.config.video_timeout_secs),
                Duration::from_millis(self.config.video_retry_backoff_ms),
            )
        } else {
            (
                Duration::from_secs(self.config.timeout_secs),
                Duration::from_millis(self.config.retry_backoff_ms),
            )
        }
    }

    /// Performs one GET and streams the body into `part_path`
    async fn transfer(
        &self,
        url: &str,
        part_path: &Path,
        limit: u64,
        timeout: Duration,
    ) -> Result<Transfer, WebberError> {
        let http_error = |source| WebberError::Http {
            url: url.to_string(),
            source,
        };

        let mut response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(http_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(WebberError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        if let Some(declared) = response.content_length() {
            if declared > limit {
                return Ok(Transfer::TooLarge { size: declared });
            }
        }

        if let Some(folder) = part_path.parent() {
            tokio::fs::create_dir_all(folder).await?;
        }
        let mut file = tokio::fs::File::create(part_path).await?;
        let mut written: u64 = 0;

        while let Some(chunk) = response.chunk().await.map_err(http_error)? {
            written += chunk.len() as u64;
            if written > limit {
                return Ok(Transfer::TooLarge { size: written });
            }
            file.write_all(&chunk).await?;
        }
        file.flush().await?;

        Ok(Transfer::Complete { bytes: written })
    }
}

async fn discard_partial(part_path: &Path) {
    if let Err(e) = tokio::fs::remove_file(part_path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::debug!("Could not remove {}: {}", part_path.display(), e);
        }
    }
}
