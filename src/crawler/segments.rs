//! HLS segment pipeline
//!
//! Fetches a playlist, extracts its segment and variant URIs, and downloads
//! them with a bounded pool of workers. Each worker owns its own
//! [`DownloadTask`] and therefore its own retry budget; outcomes travel back
//! through the join set and are merged by the pipeline alone.
//!
//! Entries that map to the same local path go to a single worker, so no two
//! workers ever write or remove the same file.

use crate::config::Config;
use crate::crawler::fetcher::{Fetcher, HttpFetcher};
use crate::crawler::parser::LinkExtractor;
use crate::crawler::task::{BodyRetention, DownloadTask, RetryPolicy, TaskReport};
use crate::state::{DownloadOutcome, OutcomeLog};
use crate::storage::{FsStorage, Storage};
use crate::MirrorError;
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use url::Url;

/// What a finished pipeline run produced
#[derive(Debug, Clone)]
pub struct SegmentReport {
    /// The playlist the run started from
    pub playlist: Url,

    /// Outcomes of every segment (and nested playlist), in playlist order
    pub log: OutcomeLog,

    /// Playlists fetched and parsed, the root included
    pub playlists_fetched: usize,
}

/// Bounded-concurrency downloader for the entries of an HLS playlist
pub struct SegmentPipeline {
    fetcher: Arc<dyn Fetcher>,
    storage: Arc<dyn Storage>,
    policy: RetryPolicy,
    concurrency: usize,
    follow_variants: bool,
}

impl SegmentPipeline {
    /// Creates a pipeline running at most `concurrency` downloads at once
    ///
    /// A concurrency of zero is treated as one.
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        storage: Arc<dyn Storage>,
        policy: RetryPolicy,
        concurrency: usize,
    ) -> Self {
        Self {
            fetcher,
            storage,
            policy,
            concurrency: concurrency.max(1),
            follow_variants: false,
        }
    }

    /// Parse `.m3u8` entries as nested playlists instead of storing them as
    /// plain files
    pub fn follow_variants(mut self, follow: bool) -> Self {
        self.follow_variants = follow;
        self
    }

    pub fn from_config(config: &Config) -> Result<Self, MirrorError> {
        let fetcher = Arc::new(HttpFetcher::from_config(config)?);
        let storage = Arc::new(FsStorage::new(&config.output.destination));

        Ok(Self::new(
            fetcher,
            storage,
            RetryPolicy::from_config(&config.crawler),
            config.segments.concurrency,
        )
        .follow_variants(config.segments.follow_variants))
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Mirrors a playlist and every entry it lists
    ///
    /// The playlist itself is persisted under the mirrored layout. Its
    /// outcome is not part of the log; a playlist that cannot be downloaded
    /// fails the whole run instead.
    ///
    /// # Returns
    ///
    /// * `Ok(SegmentReport)` - Every worker finished; failures are in the log
    /// * `Err(MirrorError::PlaylistUnavailable)` - The root playlist failed
    #[tracing::instrument(skip_all, fields(playlist = %playlist, concurrency = self.concurrency))]
    pub async fn run(&self, playlist: &Url) -> Result<SegmentReport, MirrorError> {
        let mut log = OutcomeLog::new();
        let mut queue = VecDeque::from([playlist.clone()]);
        let mut visited = HashSet::from([playlist.clone()]);
        let mut playlists_fetched = 0;

        while let Some(current) = queue.pop_front() {
            let is_root = playlists_fetched == 0 && current == *playlist;
            let TaskReport {
                outcome, resource, ..
            } = self
                .task()
                .retain(BodyRetention::Always)
                .execute(&current)
                .await;

            let body = match resource {
                Some(resource) => resource.body,
                None if is_root => {
                    return Err(MirrorError::PlaylistUnavailable {
                        url: current.to_string(),
                        reason: failure_reason(&outcome),
                    });
                }
                None => {
                    log.record(outcome);
                    continue;
                }
            };
            if !is_root {
                log.record(outcome);
            }
            playlists_fetched += 1;

            let mut segments = Vec::new();
            for uri in LinkExtractor::Hls.extract(&body, &current) {
                if self.follow_variants && self.is_playlist(&uri) {
                    if visited.insert(uri.clone()) {
                        queue.push_back(uri);
                    } else {
                        tracing::debug!(url = %uri, "playlist already processed");
                    }
                } else {
                    segments.push(uri);
                }
            }

            tracing::info!(
                playlist = %current,
                segments = segments.len(),
                "Fetching segments"
            );
            log.merge(self.fetch_segments(segments).await?);
        }

        tracing::info!(
            "Segment pipeline completed: {} succeeded, {} failed",
            log.successes().len(),
            log.failures().len()
        );
        for url in log.failed_urls() {
            tracing::warn!(url = %url, "segment download failed");
        }

        Ok(SegmentReport {
            playlist: playlist.clone(),
            log,
            playlists_fetched,
        })
    }

    /// Downloads every URI through the worker pool
    ///
    /// Outcomes are returned in input order regardless of completion order.
    /// A URI listed more than once is downloaded once and its outcome is
    /// repeated for every listing.
    async fn fetch_segments(&self, uris: Vec<Url>) -> Result<OutcomeLog, MirrorError> {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut workers = JoinSet::new();

        for group in self.group_by_path(&uris) {
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|_| MirrorError::PoolClosed)?;
            let mut task = self.task().retain(BodyRetention::Never);

            workers.spawn(async move {
                let _permit = permit;
                let mut finished: HashMap<Url, DownloadOutcome> = HashMap::new();
                let mut outcomes = Vec::with_capacity(group.len());

                for (index, uri) in group {
                    let outcome = match finished.get(&uri) {
                        Some(outcome) => outcome.clone(),
                        None => {
                            let outcome = task.execute(&uri).await.outcome;
                            finished.insert(uri, outcome.clone());
                            outcome
                        }
                    };
                    outcomes.push((index, outcome));
                }
                outcomes
            });
        }

        let mut slots: Vec<Option<DownloadOutcome>> = vec![None; uris.len()];
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(outcomes) => {
                    for (index, outcome) in outcomes {
                        slots[index] = Some(outcome);
                    }
                }
                Err(e) => tracing::error!(error = %e, "segment worker failed"),
            }
        }

        let mut log = OutcomeLog::new();
        for (slot, uri) in slots.into_iter().zip(uris) {
            log.record(slot.unwrap_or_else(|| DownloadOutcome::Failure {
                url: uri,
                error: "worker panicked".to_string(),
                retries: 0,
            }));
        }
        Ok(log)
    }

    /// Input indices grouped by local path, groups in first-appearance order
    fn group_by_path(&self, uris: &[Url]) -> Vec<Vec<(usize, Url)>> {
        let mut groups: Vec<Vec<(usize, Url)>> = Vec::new();
        let mut by_path: HashMap<PathBuf, usize> = HashMap::new();

        for (index, uri) in uris.iter().enumerate() {
            let group = *by_path.entry(self.storage.path_for(uri)).or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
            groups[group].push((index, uri.clone()));
        }

        if groups.len() < uris.len() {
            tracing::debug!(
                entries = uris.len(),
                paths = groups.len(),
                "entries share local paths"
            );
        }
        groups
    }

    fn task(&self) -> DownloadTask {
        DownloadTask::new(
            self.fetcher.clone(),
            self.storage.clone(),
            self.policy.clone(),
        )
    }

    fn is_playlist(&self, uri: &Url) -> bool {
        LinkExtractor::for_path(&self.storage.path_for(uri)).is_some()
    }
}

fn failure_reason(outcome: &DownloadOutcome) -> String {
    match outcome {
        DownloadOutcome::Failure { error, .. } => error.clone(),
        DownloadOutcome::Success { .. } => String::new(),
    }
}
