//! State module for tracking crawl progress
//!
//! This module provides the state shared between crawl workers for the
//! lifetime of a single crawl invocation.
//!
//! # Components
//!
//! - `CrawlPhase`: The Idle → Running → Drained lifecycle of a crawl
//! - `CrawlState`: Visited set, media accumulators and processed-page counter
//! - `MediaSets`: Plain per-kind URL sets handed back to callers

mod crawl_state;
mod phase;

// Re-export main types
pub use crawl_state::{CrawlState, MediaAccumulator, MediaSets};
pub use phase::CrawlPhase;
