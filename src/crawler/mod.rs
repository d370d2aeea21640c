//! Crawler module for fetching and mirroring resources
//!
//! This module contains the core mirroring logic, including:
//! - Streaming HTTP fetches behind the [`Fetcher`] trait
//! - HTML, JSON and HLS link extraction
//! - The retrying download task
//! - Crawl coordination over a breadth-first frontier
//! - The bounded-concurrency HLS segment pipeline

mod coordinator;
mod fetcher;
mod frontier;
mod parser;
mod segments;
mod task;

pub use coordinator::{Coordinator, CrawlReport};
pub use fetcher::{
    build_http_client, user_agent_string, BodyStream, FetchedResource, FetchedResponse, Fetcher,
    HttpFetcher,
};
pub use frontier::{Frontier, Link};
pub use parser::{LinkExtractor, HTML_CONTENT_TYPE, JSON_CONTENT_TYPE, PLAYLIST_EXTENSION};
pub use segments::{SegmentPipeline, SegmentReport};
pub use task::{BodyRetention, DownloadTask, RetryBudget, RetryPolicy, TaskReport};

use crate::config::{validate, Config};
use url::Url;

/// Runs a complete crawl from one seed
///
/// This is the main entry point for mirroring a site. It will:
/// 1. Validate the config
/// 2. Build the HTTP client and filesystem storage from it
/// 3. Probe the seed
/// 4. Download, extract and follow links until the frontier drains
///
/// # Arguments
///
/// * `config` - The mirror configuration
/// * `seed` - Absolute URL the crawl starts from
///
/// # Returns
///
/// * `Ok(CrawlReport)` - Crawl completed; failed downloads are in the report
/// * `Err(MirrorError)` - Invalid config, or the seed was unavailable
pub async fn crawl(config: &Config, seed: Url) -> crate::Result<CrawlReport> {
    validate(config)?;
    Coordinator::from_config(config)?.run(seed).await
}

/// Mirrors one HLS playlist and its segments
pub async fn mirror_playlist(config: &Config, playlist: &Url) -> crate::Result<SegmentReport> {
    validate(config)?;
    SegmentPipeline::from_config(config)?.run(playlist).await
}
