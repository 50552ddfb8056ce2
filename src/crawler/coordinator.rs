//! Crawl coordination
//!
//! The coordinator owns everything that lives for exactly one run: the
//! frontier, the politeness gate, the session counters and the worker pool.
//! It seeds the frontier, runs the dispatcher until the run is finished and
//! turns the final state into a [`CrawlSummary`].

use crate::config::Config;
use crate::crawler::dispatcher::{Dispatcher, Shared};
use crate::crawler::{CrawlSummary, Fetcher, HtmlParser, HttpFetcher, PageParser, TerminationReason};
use crate::frontier::Frontier;
use crate::output::{build_sink, generate_markdown_summary, PageSink};
use crate::politeness::PolitenessGate;
use crate::state::CrawlSession;
use crate::ConfigError;
use chrono::Utc;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Priority given to seed URLs
const SEED_PRIORITY: u32 = 1;

/// The pluggable parts of a crawl
pub struct Collaborators {
    pub fetcher: Arc<dyn Fetcher>,
    pub parser: Arc<dyn PageParser>,
    pub sink: Arc<dyn PageSink>,
}

/// Runs one crawl from seeds to summary
pub struct Coordinator {
    config: Config,
    frontier: Arc<Frontier>,
    gate: Arc<PolitenessGate>,
    session: Arc<CrawlSession>,
    collaborators: Collaborators,
}

impl Coordinator {
    /// Validates the configuration and sets up per-run state
    ///
    /// No URL is fetched before validation passes.
    pub fn new(config: Config, collaborators: Collaborators) -> Result<Self, ConfigError> {
        crate::config::validate(&config)?;

        let frontier = Frontier::new(&config.frontier, config.crawler.max_depth);
        let gate = PolitenessGate::new(
            Arc::clone(&collaborators.fetcher),
            &config.crawler,
            &config.user_agent,
        );
        let session = CrawlSession::new(config.crawler.max_pages);

        Ok(Self {
            config,
            frontier: Arc::new(frontier),
            gate: Arc::new(gate),
            session: Arc::new(session),
            collaborators,
        })
    }

    /// The run's frontier
    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    /// The run's politeness gate
    pub fn gate(&self) -> &PolitenessGate {
        &self.gate
    }

    /// Offers every seed at depth zero and returns how many were queued
    pub fn seed(&self) -> usize {
        self.config
            .seeds
            .iter()
            .filter(|seed| self.frontier.offer(seed, 0, SEED_PRIORITY))
            .count()
    }

    /// Runs the crawl to completion
    pub async fn run(self) -> CrawlSummary {
        self.run_with_cancel(CancellationToken::new()).await
    }

    /// Runs the crawl until it finishes or `cancel` fires
    ///
    /// On cancellation, in-flight fetches are allowed to finish but their
    /// links are not enqueued, and no new unit of work starts.
    pub async fn run_with_cancel(self, cancel: CancellationToken) -> CrawlSummary {
        let started_at = Utc::now();
        let start = Instant::now();

        let seeded = self.seed();
        info!(
            seeds = seeded,
            concurrency = self.config.crawler.concurrency,
            max_depth = self.config.crawler.max_depth,
            max_pages = self.config.crawler.max_pages,
            "Starting crawl"
        );

        let finished = cancel.child_token();
        let shared = Shared {
            frontier: Arc::clone(&self.frontier),
            gate: Arc::clone(&self.gate),
            fetcher: Arc::clone(&self.collaborators.fetcher),
            parser: Arc::clone(&self.collaborators.parser),
            sink: Arc::clone(&self.collaborators.sink),
            session: Arc::clone(&self.session),
            cancel: cancel.clone(),
            finished,
            wake: Notify::new(),
        };

        Dispatcher::new(shared, self.config.crawler.concurrency as usize)
            .run()
            .await;

        let termination = if cancel.is_cancelled() {
            TerminationReason::Cancelled
        } else if self.session.limit_reached() {
            TerminationReason::PageLimitReached
        } else if !self.frontier.is_empty() || self.frontier.checked_out() > 0 {
            TerminationReason::WorkerFailed
        } else {
            TerminationReason::FrontierExhausted
        };

        let summary = CrawlSummary {
            started_at,
            duration: start.elapsed(),
            termination,
            pages_completed: self.session.pages_completed(),
            pages_failed: self.session.pages_failed(),
            robots_denied: self.session.robots_denials(),
            frontier_remaining: self.frontier.len(),
            frontier: self.frontier.stats(),
            hosts_contacted: self.gate.hosts_contacted(),
        };

        if let Err(e) = self.collaborators.sink.finish(&summary) {
            warn!(error = %e, "Failed to finalize output");
        }

        info!(
            termination = %summary.termination,
            pages = summary.pages_completed,
            failed = summary.pages_failed,
            denied = summary.robots_denied,
            remaining = summary.frontier_remaining,
            filter_fp_rate = self.frontier.estimated_false_positive_rate(),
            elapsed_ms = summary.duration.as_millis() as u64,
            "Crawl finished"
        );

        summary
    }
}

/// Runs a crawl with the HTTP fetcher, HTML parser and configured sink
///
/// # Example
///
/// ```no_run
/// use tide_frontier::config::load_config_with_hash;
/// use tide_frontier::crawler::run_crawl;
/// use tokio_util::sync::CancellationToken;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let (config, hash) = load_config_with_hash(Path::new("crawl.toml"))?;
/// let summary = run_crawl(config, &hash, CancellationToken::new()).await?;
/// println!("{} pages", summary.pages_completed);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(
    config: Config,
    config_hash: &str,
    cancel: CancellationToken,
) -> crate::Result<CrawlSummary> {
    crate::config::validate(&config)?;

    let fetcher = HttpFetcher::from_config(&config.crawler, &config.user_agent)?;
    let sink = build_sink(&config.output, config_hash)?;
    let summary_path = config.output.summary_path.clone();

    let collaborators = Collaborators {
        fetcher: Arc::new(fetcher),
        parser: Arc::new(HtmlParser),
        sink: Arc::from(sink),
    };

    let summary = Coordinator::new(config, collaborators)?
        .run_with_cancel(cancel)
        .await;

    if let Some(path) = summary_path {
        generate_markdown_summary(&summary, Path::new(&path))?;
        info!(path = %path, "Wrote crawl summary");
    }

    Ok(summary)
}
