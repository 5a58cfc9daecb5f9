//! Page source snapshot
//!
//! Saves a page's HTML together with its linked stylesheets and scripts:
//!
//! ```text
//! <out_dir>/<site_name>/index.html
//! <out_dir>/<site_name>/css/<name>.css
//! <out_dir>/<site_name>/js/<name>.js
//! ```
//!
//! References in the saved HTML are rewritten to the local copies. Assets
//! that fail to download keep their original reference.

use crate::crawler::fetch_text;
use crate::download::filename::sanitize;
use crate::download::safe_filename_with;
use crate::url::CrawlTarget;
use crate::WebberError;
use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;
use url::Url;

/// Timeout for the page and each asset
pub const SNAPSHOT_TIMEOUT: Duration = Duration::from_secs(10);

/// Opening `<link>` and `<script>` tags; only these are rewritten
static ASSET_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<(?:link|script)\b[^>]*>").expect("hardcoded regex pattern is valid")
});

/// Kind of asset referenced by the page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Stylesheet,
    Script,
}

impl AssetKind {
    /// Subfolder under the site folder
    pub fn folder(&self) -> &'static str {
        match self {
            Self::Stylesheet => "css",
            Self::Script => "js",
        }
    }

    fn extension(&self) -> &'static str {
        match self {
            Self::Stylesheet => ".css",
            Self::Script => ".js",
        }
    }

    fn attribute(&self) -> &'static str {
        match self {
            Self::Stylesheet => "href",
            Self::Script => "src",
        }
    }
}

/// An asset reference found in the page
#[derive(Debug, Clone)]
struct AssetRef {
    kind: AssetKind,
    /// Attribute value as written in the page
    raw: String,
    url: Url,
}

/// What a snapshot wrote
#[derive(Debug, Clone, Default)]
pub struct SnapshotReport {
    /// Folder holding `index.html`
    pub root: PathBuf,
    pub stylesheets: usize,
    pub scripts: usize,
    pub failed: usize,
}

/// Folder name for a site: host without a leading `www.`, unsafe characters replaced
pub fn site_name(target: &CrawlTarget) -> String {
    let domain = target.domain();
    sanitize(domain.strip_prefix("www.").unwrap_or(domain))
}

/// Saves a page and its stylesheets and scripts under `out_dir`
///
/// # Arguments
///
/// * `client` - Shared HTTP client
/// * `url` - Absolute http(s) page URL
/// * `out_dir` - Parent folder; the site folder is created inside it
///
/// # Returns
///
/// * `Ok(SnapshotReport)` - Page saved; individual assets may have failed
/// * `Err(WebberError)` - The page itself could not be fetched or written
pub async fn snapshot(
    client: &Client,
    url: &str,
    out_dir: &Path,
) -> Result<SnapshotReport, WebberError> {
    let target = CrawlTarget::from_url(url)?;
    let base_url = Url::parse(url)?;

    tracing::info!("Downloading source code from {}", url);
    let html = fetch_text(client, url, SNAPSHOT_TIMEOUT)
        .await
        .into_body(url)?;

    let root = out_dir.join(site_name(&target));
    for kind in [AssetKind::Stylesheet, AssetKind::Script] {
        tokio::fs::create_dir_all(root.join(kind.folder())).await?;
    }

    let mut report = SnapshotReport {
        root: std::path::absolute(&root)?,
        ..SnapshotReport::default()
    };

    let mut rewritten = html.clone();
    for asset in find_assets(&html, &base_url) {
        let name = safe_filename_with(
            asset.url.as_str(),
            &[asset.kind.extension()],
            asset.kind.extension(),
        );
        let result = fetch_text(client, asset.url.as_str(), SNAPSHOT_TIMEOUT)
            .await
            .into_body(asset.url.as_str());

        let body = match result {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!("Error downloading {}: {}", asset.url, e);
                report.failed += 1;
                continue;
            }
        };

        let relative = format!("{}/{}", asset.kind.folder(), name);
        tokio::fs::write(root.join(asset.kind.folder()).join(&name), body).await?;
        rewritten = rewrite_reference(&rewritten, asset.kind.attribute(), &asset.raw, &relative);

        match asset.kind {
            AssetKind::Stylesheet => report.stylesheets += 1,
            AssetKind::Script => report.scripts += 1,
        }
    }

    tokio::fs::write(root.join("index.html"), rewritten).await?;
    tracing::info!(
        "Saved {} stylesheets and {} scripts to {}",
        report.stylesheets,
        report.scripts,
        report.root.display()
    );

    Ok(report)
}

/// Collects stylesheet and script references, deduplicated by raw value
fn find_assets(html: &str, base_url: &Url) -> Vec<AssetRef> {
    let document = Html::parse_document(html);
    let mut assets: Vec<AssetRef> = Vec::new();

    for (kind, selector) in [
        (AssetKind::Stylesheet, r#"link[rel~="stylesheet"][href]"#),
        (AssetKind::Script, "script[src]"),
    ] {
        let Ok(selector) = Selector::parse(selector) else {
            continue;
        };
        for element in document.select(&selector) {
            let Some(raw) = element.value().attr(kind.attribute()) else {
                continue;
            };
            let raw = raw.trim();
            if raw.is_empty() || assets.iter().any(|a| a.kind == kind && a.raw == raw) {
                continue;
            }
            if let Ok(url) = base_url.join(raw) {
                if url.scheme() == "http" || url.scheme() == "https" {
                    assets.push(AssetRef {
                        kind,
                        raw: raw.to_string(),
                        url,
                    });
                }
            }
        }
    }

    assets
}

/// Replaces `attr="raw"` (either quote style, raw or entity-escaped) with the local path
///
/// Only `<link>` and `<script>` tags are touched, so anchors to the same
/// path keep pointing at the live site.
fn rewrite_reference(html: &str, attr: &str, raw: &str, local: &str) -> String {
    let escaped = raw.replace('&', "&amp;");
    let replacements: Vec<(String, String)> = [raw, escaped.as_str()]
        .into_iter()
        .flat_map(|value| {
            ['"', '\''].map(|quote| {
                (
                    format!("{}={}{}{}", attr, quote, value, quote),
                    format!("{}={}{}{}", attr, quote, local, quote),
                )
            })
        })
        .collect();

    ASSET_TAG
        .replace_all(html, |caps: &regex::Captures| {
            replacements
                .iter()
                .fold(caps[0].to_string(), |tag, (from, to)| tag.replace(from, to))
        })
        .into_owned()
}
