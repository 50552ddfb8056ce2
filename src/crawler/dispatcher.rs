//! Bounded-concurrency dispatch of units of work
//!
//! The dispatcher runs a fixed pool of workers. Each worker repeatedly checks
//! a record out of the frontier, asks the politeness gate for permission and
//! a slot, fetches and parses the page, hands it to the sink and offers the
//! discovered links back to the frontier.
//!
//! Each unit of work runs in its own task; a unit that panics counts as a
//! failed page and its record is settled like any other.
//!
//! Idle workers park on a [`Notify`] rather than polling. They are woken when
//! any unit finishes (new links or budget may have appeared) and stop when
//! the run is finished: the frontier is drained, the page budget is used up,
//! or the run is cancelled.

use crate::crawler::{Fetcher, PageParser, ParsedPage};
use crate::frontier::{Checkout, Frontier, UrlRecord};
use crate::output::{CrawledPage, PageSink};
use crate::politeness::PolitenessGate;
use crate::state::{CrawlSession, PageClaim, WorkerState};
use crate::url::extract_host;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::Notify;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, trace, warn};

/// Everything workers share for one run
pub(crate) struct Shared {
    pub frontier: Arc<Frontier>,
    pub gate: Arc<PolitenessGate>,
    pub fetcher: Arc<dyn Fetcher>,
    pub parser: Arc<dyn PageParser>,
    pub sink: Arc<dyn PageSink>,
    pub session: Arc<CrawlSession>,

    /// External cancellation
    pub cancel: CancellationToken,

    /// Fires when the run is over for any reason (child of `cancel`)
    pub finished: CancellationToken,

    /// Wakes idle workers after any unit of work settles
    pub wake: Notify,
}

/// How a unit of work ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UnitOutcome {
    Completed,
    Failed,
    Denied,
    Aborted,
}

/// Fixed-size worker pool
pub(crate) struct Dispatcher {
    shared: Arc<Shared>,
    concurrency: usize,
}

impl Dispatcher {
    pub fn new(shared: Shared, concurrency: usize) -> Self {
        Self {
            shared: Arc::new(shared),
            concurrency: concurrency.max(1),
        }
    }

    /// Runs workers until the run is finished and all of them have stopped
    pub async fn run(self) {
        let mut workers = JoinSet::new();

        for id in 0..self.concurrency {
            let worker = Worker::new(id, Arc::clone(&self.shared));
            workers.spawn(worker.run());
        }

        while let Some(result) = workers.join_next().await {
            if let Err(e) = result {
                // A lost worker's checked-out record never settles
                error!(error = %e, "Worker task failed, stopping run");
                self.shared.finished.cancel();
            }
        }
    }
}

fn advance(worker: usize, state: &mut WorkerState, next: WorkerState) {
    debug_assert!(
        state.can_transition_to(next),
        "illegal worker transition {} -> {}",
        state,
        next
    );
    trace!(worker, from = %state, to = %next, "Worker state");
    *state = next;
}

struct Worker {
    id: usize,
    state: WorkerState,
    shared: Arc<Shared>,
}

impl Worker {
    fn new(id: usize, shared: Arc<Shared>) -> Self {
        Self {
            id,
            state: WorkerState::Idle,
            shared,
        }
    }

    async fn run(mut self) {
        let shared = Arc::clone(&self.shared);

        loop {
            if shared.finished.is_cancelled() {
                break;
            }

            // Register interest before looking for work so a wake-up sent
            // between the check and the wait is not lost.
            let notified = shared.wake.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let Some(claim) = shared.session.claim_page() else {
                if shared.session.limit_reached() {
                    shared.finished.cancel();
                    break;
                }

                // Budget is held by in-flight units that may still fail
                tokio::select! {
                    _ = &mut notified => continue,
                    _ = shared.finished.cancelled() => break,
                }
            };

            let record = match shared.frontier.checkout() {
                Checkout::Record(record) => record,
                Checkout::Pending => {
                    drop(claim);
                    tokio::select! {
                        _ = &mut notified => continue,
                        _ = shared.finished.cancelled() => break,
                    }
                }
                Checkout::Drained => {
                    drop(claim);
                    shared.finished.cancel();
                    break;
                }
            };

            shared.session.worker_started();
            let url = record.url().to_string();
            let unit = Unit::new(self.id, Arc::clone(&shared));

            // Each unit runs in its own task so a panicking collaborator
            // fails one page instead of the worker.
            let outcome = match tokio::spawn(unit.run(record, claim)).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(worker = self.id, %url, error = %e, "Unit of work panicked");
                    shared.session.page_failed();
                    UnitOutcome::Failed
                }
            };

            let drained = shared.frontier.settle();
            shared.session.worker_finished();
            shared.wake.notify_waiters();

            if drained || shared.session.limit_reached() {
                shared.finished.cancel();
            }

            if outcome == UnitOutcome::Aborted {
                self.state = WorkerState::Aborted;
                break;
            }
        }

        if self.state != WorkerState::Aborted && shared.cancel.is_cancelled() {
            advance(self.id, &mut self.state, WorkerState::Aborted);
        }
        trace!(worker = self.id, state = %self.state, "Worker stopped");
    }
}

/// One record taken through the crawl pipeline
///
/// The page budget claim is consumed if the page completes and returned to
/// the budget otherwise.
struct Unit {
    worker: usize,
    state: WorkerState,
    shared: Arc<Shared>,
}

impl Unit {
    fn new(worker: usize, shared: Arc<Shared>) -> Self {
        Self {
            worker,
            state: WorkerState::Idle,
            shared,
        }
    }

    async fn run(mut self, record: UrlRecord, claim: PageClaim) -> UnitOutcome {
        self.process(&record, claim).await
    }

    fn transition(&mut self, next: WorkerState) {
        advance(self.worker, &mut self.state, next);
    }

    /// Abandons the unit because the run was cancelled
    fn abort(&mut self) -> UnitOutcome {
        self.transition(WorkerState::Aborted);
        UnitOutcome::Aborted
    }

    /// Ends the unit early without completing a page
    fn give_up(&mut self, outcome: UnitOutcome) -> UnitOutcome {
        if self.state != WorkerState::Idle {
            self.transition(WorkerState::Idle);
        }
        outcome
    }

    async fn process(&mut self, record: &UrlRecord, claim: PageClaim) -> UnitOutcome {
        let shared = Arc::clone(&self.shared);
        let url = record.url();

        let Some(host) = extract_host(url) else {
            warn!(%url, "Queued URL has no host");
            shared.session.page_failed();
            return self.give_up(UnitOutcome::Failed);
        };

        let policy = shared.gate.policy_for(url).await;
        if !shared.gate.is_allowed(url, &policy) {
            debug!(%url, "Disallowed by robots.txt");
            shared.session.robots_denied();
            return self.give_up(UnitOutcome::Denied);
        }

        if shared.cancel.is_cancelled() {
            return self.abort();
        }

        let wait = shared.gate.admit(&host, &policy);
        self.transition(WorkerState::Admitted);

        if !wait.is_zero() {
            trace!(worker = self.worker, %host, wait_ms = wait.as_millis() as u64, "Waiting for slot");
            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                _ = shared.cancel.cancelled() => return self.abort(),
            }
        }

        self.transition(WorkerState::Fetching);
        let page = match shared.fetcher.fetch(url, shared.gate.user_agent()).await {
            Ok(page) => page,
            Err(e) => {
                warn!(%url, error = %e, "Fetch failed");
                shared.session.page_failed();
                return self.give_up(UnitOutcome::Failed);
            }
        };

        if shared.cancel.is_cancelled() {
            return self.abort();
        }

        self.transition(WorkerState::Parsing);
        let parsed = match shared.parser.parse(&page.body, &page.final_url) {
            Ok(parsed) => parsed,
            Err(e) => {
                debug!(%url, error = %e, "Parse failed, no links extracted");
                ParsedPage::default()
            }
        };

        let crawled = CrawledPage {
            url: url.to_string(),
            host,
            crawl_time: Utc::now(),
            depth: record.depth(),
            data: parsed,
        };

        if let Err(e) = shared.sink.persist(&crawled) {
            warn!(%url, error = %e, "Failed to persist page");
        }

        let completed = claim.complete();
        debug!(
            %url,
            depth = record.depth(),
            links = crawled.data.links.len(),
            completed = shared.session.pages_completed(),
            "Processed page"
        );

        // Only cancellation skips enqueuing; the page that fills the budget
        // still offers its links.
        if shared.cancel.is_cancelled() {
            return self.abort();
        }

        self.transition(WorkerState::Enqueuing);
        let next_depth = record.depth() + 1;
        let accepted = crawled
            .data
            .links
            .iter()
            .filter(|link| {
                let priority = UrlRecord::link_priority(record.depth(), link.no_follow);
                shared.frontier.offer(&link.url, next_depth, priority)
            })
            .count();

        trace!(worker = self.worker, %url, accepted, limit_reached = completed, "Offered links");
        self.transition(WorkerState::Idle);
        UnitOutcome::Completed
    }
}
