//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the drain loop that coordinates one crawl run:
//! - Probing the seed with a HEAD request
//! - Walking the frontier one entry at a time
//! - Dispatching each fetched body to the matching link extractor
//! - Appending discovered links and recording download outcomes

use crate::config::{Config, CrawlerConfig};
use crate::crawler::fetcher::{FetchedResource, Fetcher, HttpFetcher};
use crate::crawler::frontier::{Frontier, Link};
use crate::crawler::parser::LinkExtractor;
use crate::crawler::task::{DownloadTask, RetryPolicy};
use crate::state::{CrawlPhase, DownloadOutcome, OutcomeLog};
use crate::storage::{FsStorage, Storage};
use crate::MirrorError;
use std::path::Path;
use std::sync::Arc;
use url::Url;

/// What a finished crawl run produced
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// The seed the run started from
    pub seed: Url,

    /// Every download outcome, in processing order
    pub log: OutcomeLog,

    /// Frontier entries processed
    pub processed: usize,

    /// Links appended to the frontier after the seed
    pub discovered: usize,

    /// True if the page cap stopped the run before the frontier drained
    pub truncated: bool,
}

/// Main crawler coordinator structure
///
/// A coordinator drives exactly one run; a second call to
/// [`Coordinator::run`] fails with [`MirrorError::InvalidTransition`].
pub struct Coordinator {
    fetcher: Arc<dyn Fetcher>,
    task: DownloadTask,
    frontier: Frontier,
    log: OutcomeLog,
    phase: CrawlPhase,
    max_pages: Option<usize>,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `fetcher` - Transport used for the probe and every download
    /// * `storage` - Destination the mirrored files are written to
    /// * `config` - Retry, deduplication and page cap settings
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        storage: Arc<dyn Storage>,
        config: &CrawlerConfig,
    ) -> Self {
        let task = DownloadTask::new(
            fetcher.clone(),
            storage,
            RetryPolicy::from_config(config),
        );

        Self {
            fetcher,
            task,
            frontier: Frontier::new(config.deduplicate),
            log: OutcomeLog::new(),
            phase: CrawlPhase::Idle,
            max_pages: config.max_pages,
        }
    }

    /// Creates a coordinator backed by HTTP and the local filesystem
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(MirrorError)` - The HTTP client could not be built
    pub fn from_config(config: &Config) -> Result<Self, MirrorError> {
        let fetcher = Arc::new(HttpFetcher::from_config(config)?);
        let storage = Arc::new(FsStorage::new(&config.output.destination));
        Ok(Self::new(fetcher, storage, &config.crawler))
    }

    pub fn phase(&self) -> CrawlPhase {
        self.phase
    }

    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    /// Runs the crawl starting from `seed`
    ///
    /// This is the core crawling logic that:
    /// 1. Probes the seed and aborts if it is not available
    /// 2. Downloads the entry under the frontier cursor
    /// 3. Extracts links from the body and appends them to the frontier
    /// 4. Repeats until the cursor reaches the end of the frontier
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlReport)` - The run drained its frontier (or hit the page cap)
    /// * `Err(MirrorError::Unavailable)` - The probe failed; nothing was fetched
    #[tracing::instrument(skip_all, fields(seed = %seed))]
    pub async fn run(&mut self, seed: Url) -> Result<CrawlReport, MirrorError> {
        self.transition(CrawlPhase::Probing)?;

        if !self.fetcher.available(&seed).await {
            self.transition(CrawlPhase::Aborted)?;
            tracing::error!("Seed is not available, aborting crawl");
            return Err(MirrorError::Unavailable {
                url: seed.to_string(),
            });
        }

        self.transition(CrawlPhase::Draining)?;
        self.frontier.push(Link::seed(seed.clone()));

        let start_time = std::time::Instant::now();
        let mut processed = 0;
        let mut discovered = 0;
        let mut truncated = false;

        loop {
            if self.max_pages.is_some_and(|max| processed >= max) && !self.frontier.is_drained() {
                tracing::warn!(
                    processed,
                    pending = self.frontier.pending(),
                    "Page cap reached, stopping crawl"
                );
                truncated = true;
                break;
            }

            let Some(link) = self.frontier.next_link().cloned() else {
                break;
            };

            discovered += self.process_link(&link).await;
            processed += 1;

            if processed % 10 == 0 {
                tracing::info!(
                    "Progress: {} processed, {} pending, {} failed",
                    processed,
                    self.frontier.pending(),
                    self.log.failures().len()
                );
            }
        }

        self.transition(CrawlPhase::Done)?;

        tracing::info!(
            "Crawl completed: {} processed, {} succeeded, {} failed in {:?}",
            processed,
            self.log.successes().len(),
            self.log.failures().len(),
            start_time.elapsed()
        );
        for url in self.log.failed_urls() {
            tracing::warn!(url = %url, "download failed");
        }

        Ok(CrawlReport {
            seed,
            log: std::mem::take(&mut self.log),
            processed,
            discovered,
            truncated,
        })
    }

    /// Downloads one frontier entry and queues its links
    ///
    /// Returns the number of links appended to the frontier.
    async fn process_link(&mut self, link: &Link) -> usize {
        tracing::debug!(url = %link.url, from = ?link.discovered_from.as_ref().map(Url::as_str), "Processing URL");

        let report = self.task.execute(&link.url).await;

        let found = match (&report.outcome, &report.resource) {
            (DownloadOutcome::Success { path, .. }, Some(resource)) => {
                extract_links(&link.url, path, resource)
            }
            _ => Vec::new(),
        };
        self.log.record(report.outcome);

        found
            .into_iter()
            .filter(|url| self.frontier.push(Link::discovered(url.clone(), &link.url)))
            .count()
    }

    fn transition(&mut self, next: CrawlPhase) -> Result<(), MirrorError> {
        if !self.phase.can_transition_to(next) {
            return Err(MirrorError::InvalidTransition {
                from: self.phase,
                to: next,
            });
        }

        tracing::debug!(from = %self.phase, to = %next, "phase change");
        self.phase = next;
        Ok(())
    }
}

/// Runs every extractor that applies to a downloaded resource
///
/// The content type picks the HTML or JSON extractor; a `.m3u8` local path
/// adds the HLS extractor regardless of the content type.
fn extract_links(url: &Url, path: &Path, resource: &FetchedResource) -> Vec<Url> {
    let mut links = match LinkExtractor::for_content_type(resource.content_type.as_deref()) {
        Some(extractor) => extractor.extract(&resource.body, url),
        None => {
            tracing::info!(
                url = %url,
                content_type = resource.content_type.as_deref().unwrap_or("<none>"),
                "No extractor for content type, skipping extraction"
            );
            Vec::new()
        }
    };

    if let Some(extractor) = LinkExtractor::for_path(path) {
        links.extend(extractor.extract(&resource.body, url));
    }

    links
}
