//! Console reporting of run summaries and run history

use crate::crawler::CrawlSummary;
use crate::storage::RunRecord;

/// Prints a completion summary to stdout in a formatted manner
pub fn print_summary(summary: &CrawlSummary) {
    println!("=== Crawl Summary ===\n");

    println!("Run:");
    println!("  Started: {}", summary.started_at.to_rfc3339());
    println!("  Duration: {:.1}s", summary.duration.as_secs_f64());
    println!("  Stopped because: {}", summary.termination);
    println!();

    println!("Pages:");
    println!("  Completed: {}", summary.pages_completed);
    println!("  Failed: {}", summary.pages_failed);
    println!("  Denied by robots.txt: {}", summary.robots_denied);
    println!("  Hosts contacted: {}", summary.hosts_contacted);
    println!();

    println!("Frontier:");
    println!("  Accepted: {}", summary.frontier.accepted);
    println!("  Duplicates: {}", summary.frontier.duplicates);
    println!("  Too deep: {}", summary.frontier.too_deep);
    println!("  Invalid: {}", summary.frontier.invalid);
    println!("  Left in queue: {}", summary.frontier_remaining);
    println!();

    println!(
        "Success Rate: {:.1}% ({} / {} pages successfully processed)",
        summary.success_rate(),
        summary.pages_completed,
        summary.pages_completed + summary.pages_failed
    );
}

/// Prints stored runs, newest first
pub fn print_run_history(runs: &[RunRecord]) {
    println!("=== Crawl History ===\n");

    if runs.is_empty() {
        println!("No crawl runs recorded.");
        return;
    }

    for run in runs {
        println!("Run #{} ({})", run.id, run.status.to_db_string());
        println!("  Started: {}", run.started_at);
        if let Some(finished) = &run.finished_at {
            println!("  Finished: {}", finished);
        }
        if let Some(termination) = run.termination {
            println!("  Stopped because: {}", termination);
        }
        if let Some(ms) = run.duration_ms {
            println!("  Duration: {:.1}s", ms as f64 / 1000.0);
        }
        println!(
            "  Pages: {} completed, {} failed, {} denied by robots.txt",
            run.pages_completed, run.pages_failed, run.robots_denied
        );
        println!("  Config hash: {}", run.config_hash);
        println!();
    }
}
