//! Download outcomes and the per-run outcome log

use std::path::PathBuf;
use url::Url;

/// Terminal result of one logical download
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// The body was fetched and written to `path`
    Success { url: Url, path: PathBuf },

    /// The download was given up on
    Failure {
        url: Url,
        /// Display form of the last error seen
        error: String,
        /// Number of retries spent before giving up
        retries: u32,
    },
}

impl DownloadOutcome {
    /// The URL this outcome is about
    pub fn url(&self) -> &Url {
        match self {
            Self::Success { url, .. } | Self::Failure { url, .. } => url,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Append-only success and failure lists of a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutcomeLog {
    successes: Vec<DownloadOutcome>,
    failures: Vec<DownloadOutcome>,
}

impl OutcomeLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an outcome to the matching list
    pub fn record(&mut self, outcome: DownloadOutcome) {
        if outcome.is_success() {
            self.successes.push(outcome);
        } else {
            self.failures.push(outcome);
        }
    }

    /// Appends every outcome of another log, keeping order
    pub fn merge(&mut self, other: OutcomeLog) {
        self.successes.extend(other.successes);
        self.failures.extend(other.failures);
    }

    pub fn successes(&self) -> &[DownloadOutcome] {
        &self.successes
    }

    pub fn failures(&self) -> &[DownloadOutcome] {
        &self.failures
    }

    /// URLs of every failed download, in the order they failed
    pub fn failed_urls(&self) -> Vec<&Url> {
        self.failures.iter().map(DownloadOutcome::url).collect()
    }

    pub fn total(&self) -> usize {
        self.successes.len() + self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}
