//! URL handling module for Webber
//!
//! This module provides URL normalization, crawl-target scoping and
//! extension-based media classification. Everything here is a pure function
//! of its inputs.

mod classify;
mod domain;
mod normalize;

use std::fmt;
use std::str::FromStr;

// Re-export main functions
pub use classify::{
    path_extension, MediaClassifier, DEFAULT_VECTOR_EXTENSIONS, FONT_EXTENSIONS,
    IMAGE_EXTENSIONS, VIDEO_EXTENSIONS,
};
pub use domain::{extract_domain, CrawlTarget};
pub use normalize::{normalize_parsed, normalize_url};

/// Media kinds recognised by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    /// Raster images (.jpg, .png, ...)
    Image,
    /// Vector graphics (.svg, optionally .ai/.eps)
    Vector,
    /// Video files (.mp4, .webm, ...)
    Video,
    /// Web fonts (.woff, .ttf, .otf)
    Font,
}

impl MediaKind {
    /// All media kinds, in classification priority order
    pub const ALL: [MediaKind; 4] = [Self::Image, Self::Vector, Self::Video, Self::Font];

    /// Singular lowercase name ("image", "video", ...)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Vector => "vector",
            Self::Video => "video",
            Self::Font => "font",
        }
    }

    /// Default download folder name ("images", "videos", ...)
    pub fn folder_name(&self) -> &'static str {
        match self {
            Self::Image => "images",
            Self::Vector => "vectors",
            Self::Video => "videos",
            Self::Font => "fonts",
        }
    }

    /// Extension used when neither the filename nor the URL reveals one
    pub fn default_extension(&self) -> &'static str {
        match self {
            Self::Image => ".jpg",
            Self::Vector => ".svg",
            Self::Video => ".mp4",
            Self::Font => ".woff",
        }
    }

    /// Videos get longer timeouts, longer backoffs and a larger size limit
    pub fn is_video(&self) -> bool {
        matches!(self, Self::Video)
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MediaKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "image" | "images" => Ok(Self::Image),
            "vector" | "vectors" => Ok(Self::Vector),
            "video" | "videos" => Ok(Self::Video),
            "font" | "fonts" => Ok(Self::Font),
            other => Err(format!("unknown media kind '{}'", other)),
        }
    }
}
