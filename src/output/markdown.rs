//! Markdown summary generation
//!
//! This module generates a human-readable markdown report of a finished run.

use crate::crawler::CrawlSummary;
use crate::output::OutputResult;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes a markdown summary of the run to `output_path`
pub fn generate_markdown_summary(summary: &CrawlSummary, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_summary(summary);

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a crawl summary as markdown
pub fn format_markdown_summary(summary: &CrawlSummary) -> String {
    let mut md = String::new();

    md.push_str("# Tide-Frontier Crawl Summary\n\n");

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Started**: {}\n", summary.started_at.to_rfc3339()));
    md.push_str(&format!(
        "- **Duration**: {:.1} seconds\n",
        summary.duration.as_secs_f64()
    ));
    md.push_str(&format!("- **Termination**: {}\n\n", summary.termination));

    // Page outcomes
    md.push_str("## Pages\n\n");
    md.push_str("| Outcome | Count |\n");
    md.push_str("|---------|-------|\n");
    md.push_str(&format!("| Completed | {} |\n", summary.pages_completed));
    md.push_str(&format!("| Failed | {} |\n", summary.pages_failed));
    md.push_str(&format!(
        "| Denied by robots.txt | {} |\n\n",
        summary.robots_denied
    ));
    md.push_str(&format!(
        "- **Success Rate**: {:.2}%\n",
        summary.success_rate()
    ));
    md.push_str(&format!(
        "- **Hosts Contacted**: {}\n\n",
        summary.hosts_contacted
    ));

    // Frontier
    md.push_str("## Frontier\n\n");
    md.push_str("| Offer outcome | Count |\n");
    md.push_str("|---------------|-------|\n");
    md.push_str(&format!("| Accepted | {} |\n", summary.frontier.accepted));
    md.push_str(&format!("| Duplicate | {} |\n", summary.frontier.duplicates));
    md.push_str(&format!("| Too deep | {} |\n", summary.frontier.too_deep));
    md.push_str(&format!("| Invalid URL | {} |\n\n", summary.frontier.invalid));

    if summary.frontier_remaining > 0 {
        md.push_str(&format!(
            "{} records were still queued when the run stopped.\n",
            summary.frontier_remaining
        ));
    }

    md
}
