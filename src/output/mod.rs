//! Output module for run summaries and reports
//!
//! This module handles:
//! - Flattening crawl and segment reports into [`RunSummary`] records
//! - Writing the markdown summary file
//! - Printing aggregate statistics to the console

mod markdown;
pub mod stats;
mod summary;

pub use markdown::{format_markdown_summary, generate_markdown_summary};
pub use stats::{print_statistics, MirrorStatistics};
pub use summary::{FailedDownload, OutputError, OutputResult, RunKind, RunStatus, RunSummary};
