use crate::UrlError;
use url::Url;

/// Extracts the domain (host plus any explicit port) from a URL
///
/// Default ports are already dropped by the URL parser, so
/// `http://example.com:80/` and `http://example.com/` share a domain while
/// `http://127.0.0.1:8080/` keeps its port.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use webber::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
///
/// let url = Url::parse("http://localhost:8080/").unwrap();
/// assert_eq!(extract_domain(&url), Some("localhost:8080".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host,
    })
}

/// The acceptance boundary of a crawl, derived once from the start URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTarget {
    scheme: String,
    domain: String,
}

impl CrawlTarget {
    /// Derives the target from a start URL
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlTarget)` - The scheme and domain of the start URL
    /// * `Err(UrlError)` - The start URL is malformed or has no host
    pub fn from_url(start_url: &str) -> Result<Self, UrlError> {
        let url = Url::parse(start_url.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(UrlError::InvalidScheme(url.scheme().to_string()));
        }
        let domain = extract_domain(&url).ok_or(UrlError::MissingDomain)?;

        Ok(Self {
            scheme: url.scheme().to_string(),
            domain,
        })
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// True iff the URL parses with a scheme and a host, and its domain equals
    /// the target's domain exactly (no subdomain or suffix matching)
    pub fn is_valid_url(&self, url: &str) -> bool {
        Url::parse(url).is_ok_and(|parsed| self.accepts(&parsed))
    }

    /// Same check as [`CrawlTarget::is_valid_url`] for an already parsed URL
    pub fn accepts(&self, url: &Url) -> bool {
        !url.scheme().is_empty()
            && extract_domain(url).is_some_and(|domain| domain == self.domain)
    }
}
