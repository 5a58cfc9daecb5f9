use crate::url::MediaKind;
use url::Url;

/// Raster image extensions
pub const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".webp"];

/// Video extensions
pub const VIDEO_EXTENSIONS: &[&str] = &[".mp4", ".webm", ".mov", ".avi", ".mkv", ".m4v"];

/// Web font extensions
pub const FONT_EXTENSIONS: &[&str] = &[".woff", ".ttf", ".otf"];

/// Vector extensions used when the configuration does not override them
pub const DEFAULT_VECTOR_EXTENSIONS: &[&str] = &[".svg"];

/// Classifies URLs into media kinds by the suffix of their path
///
/// Classification is extension-based only. Extensionless or
/// redirect-obscured URLs are not recognised.
#[derive(Debug, Clone)]
pub struct MediaClassifier {
    vector_extensions: Vec<String>,
}

impl MediaClassifier {
    /// Creates a classifier with a custom vector extension set
    ///
    /// Extensions are lowercased and given a leading dot if they lack one.
    pub fn new<I, S>(vector_extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            vector_extensions: vector_extensions
                .into_iter()
                .map(|ext| dotted_lowercase(ext.as_ref()))
                .collect(),
        }
    }

    /// Classifies a URL string; unparseable URLs classify as None
    pub fn classify(&self, url: &str) -> Option<MediaKind> {
        Url::parse(url)
            .ok()
            .and_then(|parsed| self.classify_path(parsed.path()))
    }

    /// Classifies a URL path by its extension suffix, case-insensitively
    ///
    /// The kinds are checked in a fixed order, so exactly one kind (or none)
    /// is ever returned.
    pub fn classify_path(&self, path: &str) -> Option<MediaKind> {
        let path = path.to_lowercase();
        MediaKind::ALL
            .into_iter()
            .find(|kind| self.extensions(*kind).iter().any(|ext| path.ends_with(ext)))
    }

    /// The extension set for a kind, in preference order
    pub fn extensions(&self, kind: MediaKind) -> Vec<&str> {
        match kind {
            MediaKind::Image => IMAGE_EXTENSIONS.to_vec(),
            MediaKind::Vector => self.vector_extensions.iter().map(String::as_str).collect(),
            MediaKind::Video => VIDEO_EXTENSIONS.to_vec(),
            MediaKind::Font => FONT_EXTENSIONS.to_vec(),
        }
    }
}

impl Default for MediaClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_VECTOR_EXTENSIONS)
    }
}

/// Returns the lowercase extension (with its dot) of the last path segment
///
/// Leading dots of a segment such as `.htaccess` do not start an extension.
pub fn path_extension(path: &str) -> Option<String> {
    let basename = path.rsplit('/').next().unwrap_or_default();
    let stem_len = basename.trim_start_matches('.').len();
    let offset = basename.len() - stem_len;
    basename[offset..]
        .rfind('.')
        .map(|idx| basename[offset + idx..].to_lowercase())
}

fn dotted_lowercase(ext: &str) -> String {
    let ext = ext.trim().to_lowercase();
    if ext.starts_with('.') {
        ext
    } else {
        format!(".{}", ext)
    }
}
