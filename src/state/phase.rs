/// Phase definitions for a crawl run
///
/// A run moves `Idle -> Probing -> Draining -> Done`, or from `Probing` to
/// `Aborted` when the seed is not available.
use std::fmt;

/// Represents the current phase of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlPhase {
    /// Run has been created but not started
    Idle,

    /// Checking the seed with a HEAD request
    Probing,

    /// Processing frontier entries until the cursor reaches the end
    Draining,

    /// Every frontier entry has been processed (or the page cap was hit)
    Done,

    /// The seed was not available; nothing was downloaded
    Aborted,
}

impl CrawlPhase {
    /// Returns true if the run may move from this phase to `next`
    pub fn can_transition_to(&self, next: CrawlPhase) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Probing)
                | (Self::Probing, Self::Draining)
                | (Self::Probing, Self::Aborted)
                | (Self::Draining, Self::Done)
        )
    }

    /// Lowercase name used in logs and summaries
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Probing => "probing",
            Self::Draining => "draining",
            Self::Done => "done",
            Self::Aborted => "aborted",
        }
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
