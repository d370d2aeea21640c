//! Run summary types
//!
//! A [`RunSummary`] is the flattened record of one crawl or segment run that
//! the markdown report and the console statistics are rendered from.

use crate::crawler::{CrawlReport, SegmentReport};
use crate::state::{DownloadOutcome, OutcomeLog};
use crate::MirrorError;
use chrono::{DateTime, Utc};
use std::fmt;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write summary to {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Which entry point produced a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunKind {
    Crawl,
    Segments,
}

impl fmt::Display for RunKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Crawl => write!(f, "crawl"),
            Self::Segments => write!(f, "segments"),
        }
    }
}

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    /// Every queued entry was processed
    Completed,

    /// The page cap stopped the run early
    Truncated,

    /// The run never started downloading
    Aborted { reason: String },
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => write!(f, "completed"),
            Self::Truncated => write!(f, "truncated"),
            Self::Aborted { reason } => write!(f, "aborted ({})", reason),
        }
    }
}

/// One failed download as shown in reports
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedDownload {
    pub url: String,
    pub error: String,
    pub retries: u32,
}

/// Summary of one crawl or segment run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub kind: RunKind,

    /// Seed or playlist URL
    pub target: String,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub status: RunStatus,

    /// SHA-256 of the config file the run was started with
    pub config_hash: Option<String>,

    pub successes: usize,
    pub failures: Vec<FailedDownload>,
}

impl RunSummary {
    /// Summarizes a finished crawl
    pub fn from_crawl(report: &CrawlReport, started_at: DateTime<Utc>) -> Self {
        let status = if report.truncated {
            RunStatus::Truncated
        } else {
            RunStatus::Completed
        };
        Self::from_log(RunKind::Crawl, report.seed.as_str(), &report.log, status, started_at)
    }

    /// Summarizes a finished segment pipeline run
    pub fn from_segments(report: &SegmentReport, started_at: DateTime<Utc>) -> Self {
        Self::from_log(
            RunKind::Segments,
            report.playlist.as_str(),
            &report.log,
            RunStatus::Completed,
            started_at,
        )
    }

    /// Summarizes a run that failed before downloading anything
    pub fn aborted(
        kind: RunKind,
        target: &str,
        error: &MirrorError,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            kind,
            target: target.to_string(),
            started_at,
            finished_at: Utc::now(),
            status: RunStatus::Aborted {
                reason: error.to_string(),
            },
            config_hash: None,
            successes: 0,
            failures: Vec::new(),
        }
    }

    fn from_log(
        kind: RunKind,
        target: &str,
        log: &OutcomeLog,
        status: RunStatus,
        started_at: DateTime<Utc>,
    ) -> Self {
        let failures = log
            .failures()
            .iter()
            .filter_map(|outcome| match outcome {
                DownloadOutcome::Failure {
                    url,
                    error,
                    retries,
                } => Some(FailedDownload {
                    url: url.to_string(),
                    error: error.clone(),
                    retries: *retries,
                }),
                DownloadOutcome::Success { .. } => None,
            })
            .collect();

        Self {
            kind,
            target: target.to_string(),
            started_at,
            finished_at: Utc::now(),
            status,
            config_hash: None,
            successes: log.successes().len(),
            failures,
        }
    }

    pub fn with_config_hash(mut self, hash: impl Into<String>) -> Self {
        self.config_hash = Some(hash.into());
        self
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self.status, RunStatus::Aborted { .. })
    }

    /// Number of downloads attempted
    pub fn total(&self) -> usize {
        self.successes + self.failures.len()
    }

    pub fn duration_seconds(&self) -> i64 {
        (self.finished_at - self.started_at).num_seconds()
    }

    /// Returns the success rate as a percentage
    pub fn success_rate(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        (self.successes as f64 / total as f64) * 100.0
    }
}
