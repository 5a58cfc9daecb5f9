//! Filesystem-safe filenames derived from media URLs

use crate::url::{MediaClassifier, MediaKind};
use regex::Regex;
use std::sync::LazyLock;

/// Characters that are unsafe in filenames on at least one platform
static UNSAFE_CHARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"[<>:"/\\|?*\s]"#).expect("hardcoded regex pattern is valid")
});

/// Longest stem kept, in characters
pub const MAX_STEM_CHARS: usize = 200;

/// Stem used when the URL has no usable basename
pub const FALLBACK_STEM: &str = "media";

/// Generates a safe filename for a media URL, preserving its extension
///
/// A URL without an extension gets one from the first extension of `kind`
/// that appears anywhere in the URL, or else the kind's default.
///
/// # Example
///
/// ```
/// use webber::download::safe_filename;
/// use webber::url::{MediaClassifier, MediaKind};
///
/// let classifier = MediaClassifier::default();
/// let name = safe_filename("https://e.com/my photo.png?w=2", MediaKind::Image, &classifier);
/// assert_eq!(name, "my_photo.png");
/// ```
pub fn safe_filename(url: &str, kind: MediaKind, classifier: &MediaClassifier) -> String {
    safe_filename_with(url, &classifier.extensions(kind), kind.default_extension())
}

/// Generates a safe filename, inferring a missing extension from `candidates`
///
/// Used directly for non-media files such as stylesheets and scripts.
pub fn safe_filename_with(url: &str, candidates: &[&str], default_extension: &str) -> String {
    let clean = url.split(['?', '#']).next().unwrap_or_default();
    let basename = clean.rsplit('/').next().unwrap_or_default();
    let (stem, extension) = split_extension(basename);

    let extension = match extension {
        Some(ext) => sanitize(ext),
        None => infer_extension(url, candidates, default_extension).to_string(),
    };

    let stem = sanitize(stem);
    if stem.is_empty() {
        return format!("{}{}", FALLBACK_STEM, extension);
    }

    let stem: String = stem.chars().take(MAX_STEM_CHARS).collect();
    format!("{}{}", stem, extension)
}

/// Splits a basename into stem and extension (with its dot)
///
/// Leading dots belong to the stem, so `.htaccess` has no extension.
fn split_extension(basename: &str) -> (&str, Option<&str>) {
    let leading = basename.len() - basename.trim_start_matches('.').len();
    match basename[leading..].rfind('.') {
        Some(idx) => {
            let split = leading + idx;
            (&basename[..split], Some(&basename[split..]))
        }
        None => (basename, None),
    }
}

fn infer_extension<'a>(url: &str, candidates: &[&'a str], default_extension: &'a str) -> &'a str {
    let lower = url.to_lowercase();
    candidates
        .iter()
        .copied()
        .find(|ext| lower.contains(ext))
        .unwrap_or(default_extension)
}

/// Replaces characters that are unsafe in filenames with `_`
pub(crate) fn sanitize(value: &str) -> String {
    UNSAFE_CHARS.replace_all(value, "_").into_owned()
}
