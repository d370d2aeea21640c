//! Markdown summary generation
//!
//! This module generates a human-readable markdown report of every run,
//! including counts, timing and the list of failed downloads.

use crate::output::summary::{OutputError, OutputResult, RunSummary};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Failed downloads listed per run before the table is cut short
const MAX_LISTED_FAILURES: usize = 100;

/// Generates a markdown summary of the given runs
///
/// # Arguments
///
/// * `runs` - Summaries of every run, in execution order
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote markdown summary
/// * `Err(OutputError)` - Failed to write summary
pub fn generate_markdown_summary(runs: &[RunSummary], output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_summary(runs);

    let write_error = |source: std::io::Error| OutputError::Write {
        path: output_path.display().to_string(),
        source,
    };
    let mut file = File::create(output_path).map_err(write_error)?;
    file.write_all(markdown.as_bytes()).map_err(write_error)?;

    Ok(())
}

/// Formats run summaries as markdown
pub fn format_markdown_summary(runs: &[RunSummary]) -> String {
    let mut md = String::new();

    md.push_str("# Sumi-Mirror Run Summary\n\n");

    // Overview table
    md.push_str("## Overview\n\n");
    md.push_str("| Kind | Target | Status | Succeeded | Failed |\n");
    md.push_str("|------|--------|--------|-----------|--------|\n");
    for run in runs {
        md.push_str(&format!(
            "| {} | {} | {} | {} | {} |\n",
            run.kind,
            run.target,
            run.status,
            run.successes,
            run.failures.len()
        ));
    }
    md.push('\n');

    for run in runs {
        md.push_str(&format!("## {} {}\n\n", capitalize(&run.kind.to_string()), run.target));
        md.push_str(&format!("- **Started**: {}\n", run.started_at.to_rfc3339()));
        md.push_str(&format!("- **Finished**: {}\n", run.finished_at.to_rfc3339()));
        md.push_str(&format!("- **Duration**: {} seconds\n", run.duration_seconds()));
        md.push_str(&format!("- **Status**: {}\n", run.status));
        if let Some(hash) = &run.config_hash {
            md.push_str(&format!("- **Config Hash**: {}\n", hash));
        }
        md.push_str(&format!("- **Succeeded**: {}\n", run.successes));
        md.push_str(&format!("- **Failed**: {}\n", run.failures.len()));
        md.push_str(&format!("- **Success Rate**: {:.2}%\n\n", run.success_rate()));

        if !run.failures.is_empty() {
            md.push_str("### Failed Downloads\n\n");
            md.push_str("| URL | Retries | Last Error |\n");
            md.push_str("|-----|---------|------------|\n");

            for failure in run.failures.iter().take(MAX_LISTED_FAILURES) {
                md.push_str(&format!(
                    "| {} | {} | {} |\n",
                    failure.url,
                    failure.retries,
                    failure.error.replace('|', "\\|")
                ));
            }
            if run.failures.len() > MAX_LISTED_FAILURES {
                md.push_str(&format!(
                    "\n... and {} more\n",
                    run.failures.len() - MAX_LISTED_FAILURES
                ));
            }
            md.push('\n');
        }
    }

    md
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
