//! Retrying download task
//!
//! A [`DownloadTask`] fetches one URL, retrying transport failures until its
//! [`RetryBudget`] runs out, and streams the body to the URL's mirrored path
//! chunk by chunk.
//!
//! # Retry Logic
//!
//! | Condition | Action |
//! |-----------|--------|
//! | Transport error (request or mid-body), budget left | Remove partial file, spend one retry, fetch again |
//! | Transport error, budget spent | Remove partial file, record Failure, reset budget |
//! | Filesystem error | Remove partial file, record Failure (not retried), reset budget |
//! | Body fully written | Record Success, reset budget |

use crate::config::{CrawlerConfig, DEFAULT_MAX_RETRIES};
use crate::crawler::fetcher::{FetchedResource, FetchedResponse, Fetcher};
use crate::crawler::parser::LinkExtractor;
use crate::state::DownloadOutcome;
use crate::storage::{Storage, StorageError};
use crate::TransportError;
use futures_util::StreamExt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};
use url::Url;

/// Upper bound on the delay between two attempts
const MAX_BACKOFF: Duration = Duration::from_secs(32);

/// How many times to retry and how long to wait in between
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: Duration::ZERO,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self::new(
            config.max_retries,
            Duration::from_millis(config.retry_delay_ms),
        )
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Delay before the given retry (1-indexed): `base * 2^(retry - 1)`, capped
    pub fn delay_for(&self, retry: u32) -> Duration {
        if self.base_delay.is_zero() || retry == 0 {
            return Duration::ZERO;
        }

        let factor = 2u32.saturating_pow(retry - 1);
        self.base_delay
            .checked_mul(factor)
            .map_or(MAX_BACKOFF, |delay| delay.min(MAX_BACKOFF))
    }
}

/// Remaining retries for the URL currently being downloaded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryBudget {
    max: u32,
    remaining: u32,
}

impl RetryBudget {
    pub fn new(max: u32) -> Self {
        Self {
            max,
            remaining: max,
        }
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Retries used since the last reset
    pub fn spent(&self) -> u32 {
        self.max - self.remaining
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }

    /// Spends one retry; returns false if none was left
    pub fn try_consume(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        true
    }

    pub fn reset(&mut self) {
        self.remaining = self.max;
    }
}

/// Which downloaded bodies a task keeps in memory for its caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BodyRetention {
    /// Bodies some [`LinkExtractor`] can parse, by content type or extension
    #[default]
    Extractable,

    /// Every body
    Always,

    /// None; bodies only go to disk
    Never,
}

impl BodyRetention {
    fn keeps(&self, content_type: Option<&str>, path: &Path) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Extractable => {
                LinkExtractor::for_content_type(content_type).is_some()
                    || LinkExtractor::for_path(path).is_some()
            }
        }
    }
}

/// Why a single attempt did not produce a complete file
enum AttemptError {
    /// Retryable
    Transport(TransportError),
    Storage(StorageError),
}

/// What one [`DownloadTask::execute`] call produced
#[derive(Debug, Clone)]
pub struct TaskReport {
    pub outcome: DownloadOutcome,

    /// The fetched resource, present only on success. Its body is empty
    /// unless the task's [`BodyRetention`] kept it.
    pub resource: Option<FetchedResource>,

    /// Number of fetch attempts made
    pub attempts: u32,
}

/// Fetch-with-retry-and-persist for one URL at a time
pub struct DownloadTask {
    fetcher: Arc<dyn Fetcher>,
    storage: Arc<dyn Storage>,
    policy: RetryPolicy,
    budget: RetryBudget,
    retention: BodyRetention,
}

impl DownloadTask {
    pub fn new(fetcher: Arc<dyn Fetcher>, storage: Arc<dyn Storage>, policy: RetryPolicy) -> Self {
        let budget = RetryBudget::new(policy.max_retries());
        Self {
            fetcher,
            storage,
            policy,
            budget,
            retention: BodyRetention::default(),
        }
    }

    pub fn retain(mut self, retention: BodyRetention) -> Self {
        self.retention = retention;
        self
    }

    /// Current state of the retry budget
    pub fn budget(&self) -> RetryBudget {
        self.budget
    }

    /// Downloads `url` into its mirrored local path
    ///
    /// Never returns an error: every failure becomes a
    /// [`DownloadOutcome::Failure`]. The budget is back at its maximum when
    /// this returns.
    #[instrument(skip_all, fields(url = %url))]
    pub async fn execute(&mut self, url: &Url) -> TaskReport {
        let path = self.storage.path_for(url);
        let mut attempts = 0;

        loop {
            attempts += 1;

            let attempt = match self.fetcher.fetch(url).await {
                Ok(response) => self.persist(&path, response).await,
                Err(error) => Err(AttemptError::Transport(error)),
            };

            let error = match attempt {
                Ok(resource) => {
                    self.budget.reset();
                    info!(path = %path.display(), attempts, "downloaded");
                    return TaskReport {
                        outcome: DownloadOutcome::Success {
                            url: url.clone(),
                            path,
                        },
                        resource: Some(resource),
                        attempts,
                    };
                }
                Err(AttemptError::Storage(e)) => {
                    self.budget.reset();
                    warn!(path = %path.display(), error = %e, "failed to store download");
                    self.discard(&path).await;
                    return TaskReport {
                        outcome: DownloadOutcome::Failure {
                            url: url.clone(),
                            error: e.to_string(),
                            retries: attempts - 1,
                        },
                        resource: None,
                        attempts,
                    };
                }
                Err(AttemptError::Transport(error)) => error,
            };

            self.discard(&path).await;

            if self.budget.try_consume() {
                let retry = self.budget.spent();
                warn!(
                    error = %error,
                    retry,
                    remaining = self.budget.remaining(),
                    "fetch failed, retrying"
                );

                let delay = self.policy.delay_for(retry);
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                continue;
            }

            let retries = self.budget.max();
            self.budget.reset();
            warn!(error = %error, retries, "giving up after {} retries", retries);

            return TaskReport {
                outcome: DownloadOutcome::Failure {
                    url: url.clone(),
                    error: error.to_string(),
                    retries,
                },
                resource: None,
                attempts,
            };
        }
    }

    async fn discard(&self, path: &Path) {
        if let Err(e) = self.storage.remove_if_exists(path).await {
            warn!(path = %path.display(), error = %e, "failed to remove partial file");
        }
    }

    /// Streams one response body into `path`
    async fn persist(
        &self,
        path: &Path,
        response: FetchedResponse,
    ) -> Result<FetchedResource, AttemptError> {
        let FetchedResponse {
            status,
            content_type,
            mut body,
        } = response;
        let keep = self.retention.keeps(content_type.as_deref(), path);

        let mut writer = self
            .storage
            .create(path)
            .await
            .map_err(AttemptError::Storage)?;
        let mut kept = Vec::new();
        let mut written = 0usize;

        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(AttemptError::Transport)?;
            writer
                .write_chunk(&chunk)
                .await
                .map_err(AttemptError::Storage)?;
            written += chunk.len();
            if keep {
                kept.extend_from_slice(&chunk);
            }
        }
        writer.finish().await.map_err(AttemptError::Storage)?;

        tracing::trace!(path = %path.display(), bytes = written, kept = keep, "body written");
        Ok(FetchedResource {
            status,
            content_type,
            body: kept,
        })
    }
}
