//! Download module for persisting discovered media
//!
//! This module handles:
//! - Safe filename generation from media URLs
//! - Extension filtering and size limits per batch
//! - Sequential, retried, streamed downloads with run totals

pub(crate) mod filename;
mod pipeline;
mod request;

pub use filename::{safe_filename, safe_filename_with, FALLBACK_STEM, MAX_STEM_CHARS};
pub use pipeline::Downloader;
pub use request::{
    mb_to_bytes, DownloadOutcome, DownloadRequest, DownloadSummary, BYTES_PER_MB,
};
