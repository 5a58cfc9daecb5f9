//! HTML media extractor
//!
//! This module turns a page's markup into:
//! - Same-domain links to follow (from `<a href>`)
//! - Classified media URLs from known attribute and inline-style locations
//! - Font URLs referenced by linked stylesheets and inline `<style>` blocks
//!
//! The markup pass is synchronous and pure. The stylesheet pass fetches each
//! linked stylesheet and is best-effort: a stylesheet that cannot be fetched
//! is logged and skipped.

use crate::crawler::fetcher::fetch_text;
use crate::state::{CrawlState, MediaSets};
use crate::url::{normalize_parsed, CrawlTarget, MediaClassifier, MediaKind};
use regex::Regex;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;
use std::time::Duration;
use url::Url;

/// Matches `url(...)` references in CSS, with or without quotes
static CSS_URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"url\(\s*['"]?([^'"()]+)['"]?\s*\)"#).expect("hardcoded regex pattern is valid")
});

/// Elements whose attributes may reference media
const MEDIA_ELEMENTS: &str = "img, source, picture, object, embed, link, video";

/// Attributes holding a single media reference
const SOURCE_ATTRIBUTES: &[&str] = &["src", "data-src", "href", "poster", "data"];

/// Everything extracted from a single page
#[derive(Debug, Clone, Default)]
pub struct PageExtraction {
    /// Normalized same-domain links
    pub links: HashSet<String>,

    /// Normalized media URLs by kind
    pub media: MediaSets,

    /// Absolute URLs of linked stylesheets
    pub stylesheets: Vec<Url>,
}

/// Extracts links, media and stylesheet references from HTML markup
///
/// Links are kept only if they belong to `target`; media is captured from
/// any host.
///
/// # Example
///
/// ```
/// use url::Url;
/// use webber::crawler::extract_media;
/// use webber::url::{CrawlTarget, MediaClassifier, MediaKind};
///
/// let html = r#"<img src="/a.png"><a href="/page2">Next</a>"#;
/// let base = Url::parse("https://example.com/").unwrap();
/// let target = CrawlTarget::from_url(base.as_str()).unwrap();
/// let page = extract_media(html, &base, &target, &MediaClassifier::default());
///
/// assert!(page.links.contains("https://example.com/page2"));
/// assert!(page.media.get(MediaKind::Image).contains("https://example.com/a.png"));
/// ```
pub fn extract_media(
    html: &str,
    base_url: &Url,
    target: &CrawlTarget,
    classifier: &MediaClassifier,
) -> PageExtraction {
    let document = Html::parse_document(html);

    let mut page = PageExtraction {
        links: extract_links(&document, base_url, target),
        ..PageExtraction::default()
    };
    extract_element_media(&document, base_url, classifier, &mut page.media);
    extract_inline_style_fonts(&document, base_url, classifier, &mut page.media);
    page.stylesheets = extract_stylesheets(&document, base_url);

    page
}

/// Extracts font URLs from stylesheet text, resolved against the stylesheet's own URL
pub fn extract_css_fonts(css: &str, css_url: &Url, classifier: &MediaClassifier) -> HashSet<String> {
    let mut media = MediaSets::new();
    for raw in css_urls(css) {
        insert_candidate(&raw, css_url, classifier, Some(MediaKind::Font), &mut media);
    }
    media.fonts
}

/// Returns every `url(...)` reference in a piece of CSS
pub fn css_urls(css: &str) -> Vec<String> {
    CSS_URL_REGEX
        .captures_iter(css)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Extracts all same-domain links from `<a href>` elements
fn extract_links(document: &Html, base_url: &Url, target: &CrawlTarget) -> HashSet<String> {
    let mut links = HashSet::new();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            let Some(href) = element.value().attr("href") else {
                continue;
            };
            let Some(absolute_url) = resolve_link(href, base_url) else {
                continue;
            };
            if !target.accepts(&absolute_url) {
                continue;
            }
            if let Ok(normalized) = normalize_parsed(&absolute_url) {
                links.insert(normalized);
            }
        }
    }

    links
}

/// Classifies every candidate source of every media-bearing element
fn extract_element_media(
    document: &Html,
    base_url: &Url,
    classifier: &MediaClassifier,
    media: &mut MediaSets,
) {
    let Ok(selector) = Selector::parse(MEDIA_ELEMENTS) else {
        return;
    };

    for element in document.select(&selector) {
        for raw in candidate_sources(&element) {
            insert_candidate(&raw, base_url, classifier, None, media);
        }
    }
}

/// Scans inline `<style>` blocks for font references
fn extract_inline_style_fonts(
    document: &Html,
    base_url: &Url,
    classifier: &MediaClassifier,
    media: &mut MediaSets,
) {
    let Ok(selector) = Selector::parse("style") else {
        return;
    };

    for element in document.select(&selector) {
        let css: String = element.text().collect();
        for raw in css_urls(&css) {
            insert_candidate(&raw, base_url, classifier, Some(MediaKind::Font), media);
        }
    }
}

/// Collects absolute URLs of `<link rel="stylesheet">` elements
fn extract_stylesheets(document: &Html, base_url: &Url) -> Vec<Url> {
    let mut seen = HashSet::new();
    let mut stylesheets = Vec::new();

    if let Ok(selector) = Selector::parse(r#"link[rel~="stylesheet"][href]"#) {
        for element in document.select(&selector) {
            if let Some(url) = element
                .value()
                .attr("href")
                .and_then(|href| resolve_link(href, base_url))
            {
                if seen.insert(url.to_string()) {
                    stylesheets.push(url);
                }
            }
        }
    }

    stylesheets
}

/// Raw source strings of one element, in no particular priority
fn candidate_sources(element: &ElementRef) -> Vec<String> {
    let value = element.value();
    let mut sources: Vec<String> = SOURCE_ATTRIBUTES
        .iter()
        .filter_map(|attr| value.attr(attr))
        .map(str::to_string)
        .collect();

    if let Some(srcset) = value.attr("srcset") {
        sources.extend(parse_srcset(srcset));
    }

    if let Some(style) = value.attr("style") {
        sources.extend(css_urls(style));
    }

    sources
}

/// First token of each comma-separated `srcset` entry
fn parse_srcset(srcset: &str) -> Vec<String> {
    srcset
        .split(',')
        .filter_map(|entry| entry.split_whitespace().next())
        .map(str::to_string)
        .collect()
}

/// Resolves, classifies and normalizes one candidate, inserting it on a match
///
/// With `only` set, candidates of any other kind are discarded.
fn insert_candidate(
    raw: &str,
    base_url: &Url,
    classifier: &MediaClassifier,
    only: Option<MediaKind>,
    media: &mut MediaSets,
) {
    let Some(url) = resolve_link(raw, base_url) else {
        return;
    };
    let Some(kind) = classifier.classify_path(url.path()) else {
        tracing::trace!("Discarding unclassified candidate {}", url);
        return;
    };
    if only.is_some_and(|wanted| wanted != kind) {
        return;
    }
    if let Ok(normalized) = normalize_parsed(&url) {
        media.insert(kind, normalized);
    }
}

/// Resolves a raw reference to an absolute HTTP(S) URL
///
/// Returns None if the reference should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Fragment-only references
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_lowercase();
    if lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:")
    {
        return None;
    }

    base_url
        .join(href)
        .ok()
        .filter(|url| url.scheme() == "http" || url.scheme() == "https")
}

/// Page extractor bound to one crawl target
///
/// Combines the markup pass with the best-effort stylesheet font pass.
#[derive(Debug, Clone)]
pub struct Extractor {
    client: Client,
    target: CrawlTarget,
    classifier: MediaClassifier,
    stylesheet_timeout: Duration,
}

impl Extractor {
    pub fn new(
        client: Client,
        target: CrawlTarget,
        classifier: MediaClassifier,
        stylesheet_timeout: Duration,
    ) -> Self {
        Self {
            client,
            target,
            classifier,
            stylesheet_timeout,
        }
    }

    pub fn target(&self) -> &CrawlTarget {
        &self.target
    }

    pub fn classifier(&self) -> &MediaClassifier {
        &self.classifier
    }

    /// Extracts links and media from a page, including fonts from its stylesheets
    pub async fn extract(&self, html: &str, base_url: &Url) -> PageExtraction {
        let mut page = extract_media(html, base_url, &self.target, &self.classifier);

        let fonts = self.discover_stylesheet_fonts(&page.stylesheets).await;
        page.media.fonts.extend(fonts);

        page
    }

    /// Like [`Extractor::extract`], but skips stylesheets this crawl has already scanned
    pub async fn extract_for_crawl(
        &self,
        html: &str,
        base_url: &Url,
        state: &CrawlState,
    ) -> PageExtraction {
        let mut page = extract_media(html, base_url, &self.target, &self.classifier);

        let fresh: Vec<Url> = page
            .stylesheets
            .iter()
            .filter(|css_url| state.claim_stylesheet(css_url.as_str()))
            .cloned()
            .collect();
        let fonts = self.discover_stylesheet_fonts(&fresh).await;
        page.media.fonts.extend(fonts);

        page
    }

    /// Fetches each stylesheet and collects its font references
    ///
    /// A stylesheet that fails to load contributes nothing; the error never
    /// reaches the caller.
    pub async fn discover_stylesheet_fonts(&self, stylesheets: &[Url]) -> HashSet<String> {
        let mut fonts = HashSet::new();

        for css_url in stylesheets {
            let result = fetch_text(&self.client, css_url.as_str(), self.stylesheet_timeout).await;
            match result.into_body(css_url.as_str()) {
                Ok(css) => {
                    let found = extract_css_fonts(&css, css_url, &self.classifier);
                    tracing::debug!("Found {} fonts in stylesheet {}", found.len(), css_url);
                    fonts.extend(found);
                }
                Err(e) => {
                    tracing::warn!("Skipping stylesheet {}: {}", css_url, e);
                }
            }
        }

        fonts
    }
}
