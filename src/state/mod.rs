//! State module for tracking crawl progress
//!
//! This module provides the bookkeeping shared by the crawl engine and the
//! segment pipeline.
//!
//! # Components
//!
//! - `CrawlPhase`: The phase a crawl run is in (probing, draining, done, aborted)
//! - `DownloadOutcome`: The terminal result of one logical download
//! - `OutcomeLog`: Append-only success and failure lists for a run

mod outcome;
mod phase;

// Re-export main types
pub use outcome::{DownloadOutcome, OutcomeLog};
pub use phase::CrawlPhase;
