//! HTTP fetcher implementation
//!
//! This module handles the page and stylesheet requests of the crawler:
//! - Building the shared HTTP client with the configured user agent
//! - Single-attempt GET requests with a per-request timeout
//! - Error classification into status and transport failures

use crate::config::UserAgentConfig;
use crate::WebberError;
use reqwest::Client;
use std::time::Duration;

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchResult {
    /// Successfully fetched the resource
    Success {
        /// Final URL after redirects
        final_url: String,
        /// HTTP status code
        status_code: u16,
        /// Response body as text
        body: String,
    },

    /// Server answered with a non-success status
    HttpError {
        /// The HTTP status code
        status_code: u16,
    },

    /// Transport failure (connection refused, timeout, body read error)
    NetworkError {
        /// The underlying client error
        source: reqwest::Error,
    },
}

impl FetchResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Converts the result into the response body or a typed error
    pub fn into_body(self, url: &str) -> Result<String, WebberError> {
        match self {
            Self::Success { body, .. } => Ok(body),
            Self::HttpError { status_code } => Err(WebberError::Status {
                url: url.to_string(),
                status: status_code,
            }),
            Self::NetworkError { source } => Err(WebberError::Http {
                url: url.to_string(),
                source,
            }),
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// The client is shared by page fetches, stylesheet fetches and media
/// downloads; each request sets its own timeout.
///
/// # Example
///
/// ```no_run
/// use webber::config::UserAgentConfig;
/// use webber::crawler::build_http_client;
///
/// let client = build_http_client(&UserAgentConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL as text with a single attempt
///
/// Failures are never retried here: a page that fails is logged by the
/// caller and skipped.
pub async fn fetch_text(client: &Client, url: &str, timeout: Duration) -> FetchResult {
    let response = match client.get(url).timeout(timeout).send().await {
        Ok(response) => response,
        Err(source) => return FetchResult::NetworkError { source },
    };

    let status = response.status();
    if !status.is_success() {
        return FetchResult::HttpError {
            status_code: status.as_u16(),
        };
    }

    let final_url = response.url().to_string();
    match response.text().await {
        Ok(body) => FetchResult::Success {
            final_url,
            status_code: status.as_u16(),
            body,
        },
        Err(source) => FetchResult::NetworkError { source },
    }
}
