//! Aggregate statistics across runs
//!
//! This module totals the run summaries of one invocation and prints them
//! to stdout.

use crate::output::summary::{RunKind, RunSummary};

/// Totals over every run of one invocation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MirrorStatistics {
    /// Number of crawl runs
    pub crawls: usize,

    /// Number of segment pipeline runs
    pub playlists: usize,

    /// Runs that aborted before downloading
    pub aborted: usize,

    /// Successful downloads over all runs
    pub successes: usize,

    /// Failed downloads over all runs
    pub failures: usize,
}

impl MirrorStatistics {
    pub fn from_summaries(runs: &[RunSummary]) -> Self {
        runs.iter().fold(Self::default(), |mut stats, run| {
            match run.kind {
                RunKind::Crawl => stats.crawls += 1,
                RunKind::Segments => stats.playlists += 1,
            }
            if run.is_aborted() {
                stats.aborted += 1;
            }
            stats.successes += run.successes;
            stats.failures += run.failures.len();
            stats
        })
    }

    /// Returns the success rate as a percentage
    pub fn success_rate(&self) -> f64 {
        let total = self.successes + self.failures;
        if total == 0 {
            return 0.0;
        }
        (self.successes as f64 / total as f64) * 100.0
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `runs` - The summaries to display
pub fn print_statistics(runs: &[RunSummary]) {
    let stats = MirrorStatistics::from_summaries(runs);

    println!("=== Mirror Statistics ===\n");

    println!("Overview:");
    println!("  Crawl runs: {}", stats.crawls);
    println!("  Playlist runs: {}", stats.playlists);
    println!("  Aborted runs: {}", stats.aborted);
    println!();

    println!("Runs:");
    for run in runs {
        println!(
            "  [{}] {}: {} ({} ok, {} failed)",
            run.kind,
            run.target,
            run.status,
            run.successes,
            run.failures.len()
        );
    }
    println!();

    let failed: Vec<_> = runs.iter().flat_map(|run| &run.failures).collect();
    if !failed.is_empty() {
        println!("Failed Downloads ({}):", failed.len());
        for failure in failed {
            println!("  - {} ({})", failure.url, failure.error);
        }
        println!();
    }

    println!(
        "Success Rate: {:.1}% ({} / {} downloads)",
        stats.success_rate(),
        stats.successes,
        stats.successes + stats.failures
    );
}
