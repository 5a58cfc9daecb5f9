use crate::url::extract_domain;
use crate::UrlError;
use url::{form_urlencoded, Url};

/// Substrings that mark a query key as a tracking parameter (matched case-insensitively)
const TRACKING_MARKERS: &[&str] = &["utm_", "fbclid", "ref_"];

/// Normalizes a URL according to Webber's normalization rules
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed, non-HTTP(S) or hostless
/// 2. Remove fragment (everything after #)
/// 3. Remove tracking query parameters, keeping the order of the rest
/// 4. Remove empty query string (trailing ?)
///
/// The result has the form `scheme://host[:port]/path[?query]`. Query pairs
/// without `=` are kept as keys with an empty value.
///
/// # Examples
///
/// ```
/// use webber::url::normalize_url;
///
/// let url = normalize_url("https://example.com/a.png?utm_source=x#top").unwrap();
/// assert_eq!(url, "https://example.com/a.png");
/// ```
pub fn normalize_url(url_str: &str) -> Result<String, UrlError> {
    let url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;
    normalize_parsed(&url)
}

/// Normalizes an already parsed URL
pub fn normalize_parsed(url: &Url) -> Result<String, UrlError> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    let authority = extract_domain(url).ok_or(UrlError::MissingDomain)?;
    let mut normalized = format!("{}://{}{}", url.scheme(), authority, url.path());

    if let Some(query) = url.query().and_then(filter_query) {
        normalized.push('?');
        normalized.push_str(&query);
    }

    Ok(normalized)
}

/// Drops tracking parameters and re-encodes what is left
///
/// Returns None when no parameter survives.
fn filter_query(query: &str) -> Option<String> {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    let mut kept = 0usize;

    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        if is_tracking_param(&key) {
            continue;
        }
        serializer.append_pair(&key, &value);
        kept += 1;
    }

    (kept > 0).then(|| serializer.finish())
}

/// Checks if a query parameter is a tracking parameter
fn is_tracking_param(key: &str) -> bool {
    let key = key.to_lowercase();
    TRACKING_MARKERS.iter().any(|marker| key.contains(marker))
}
