use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

/// Counters for one crawl run
///
/// Created when the coordinator starts and dropped when the run ends.
/// Pages are admitted against the page budget with [`reserve_page`]
/// before any fetch starts, so the completed count can never overshoot
/// the cap even with many workers racing for the last slot.
///
/// [`reserve_page`]: CrawlSession::reserve_page
#[derive(Debug)]
pub struct CrawlSession {
    max_pages: u64,
    reserved: AtomicU64,
    pages_completed: AtomicU64,
    pages_failed: AtomicU64,
    robots_denied: AtomicU64,
    active_workers: AtomicUsize,
}

impl CrawlSession {
    /// Creates a session with the given page budget
    pub fn new(max_pages: u64) -> Self {
        Self {
            max_pages,
            reserved: AtomicU64::new(0),
            pages_completed: AtomicU64::new(0),
            pages_failed: AtomicU64::new(0),
            robots_denied: AtomicU64::new(0),
            active_workers: AtomicUsize::new(0),
        }
    }

    /// Claims one page of the budget
    ///
    /// Returns false once the budget is fully claimed by completed or
    /// in-flight pages.
    pub fn reserve_page(&self) -> bool {
        self.reserved
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                (n < self.max_pages).then_some(n + 1)
            })
            .is_ok()
    }

    /// Claims one page of the budget as a guard
    ///
    /// The page goes back to the budget when the claim is dropped without
    /// [`PageClaim::complete`], including while a panicking unit unwinds.
    pub fn claim_page(self: &Arc<Self>) -> Option<PageClaim> {
        self.reserve_page().then(|| PageClaim {
            session: Arc::clone(self),
            completed: false,
        })
    }

    /// Returns a claimed page to the budget (the page was not completed)
    pub fn release_page(&self) {
        let _ = self
            .reserved
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
    }

    /// Records a successfully processed page
    ///
    /// Returns true when this page completes the budget.
    pub fn page_completed(&self) -> bool {
        let completed = self.pages_completed.fetch_add(1, Ordering::SeqCst) + 1;
        completed >= self.max_pages
    }

    /// Records a page whose fetch failed
    pub fn page_failed(&self) {
        self.pages_failed.fetch_add(1, Ordering::SeqCst);
    }

    /// Records a URL skipped because robots.txt disallows it
    pub fn robots_denied(&self) {
        self.robots_denied.fetch_add(1, Ordering::SeqCst);
    }

    /// Marks a worker as having started a unit of work
    pub fn worker_started(&self) {
        self.active_workers.fetch_add(1, Ordering::SeqCst);
    }

    /// Marks a worker as having finished a unit of work
    pub fn worker_finished(&self) {
        self.active_workers.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn max_pages(&self) -> u64 {
        self.max_pages
    }

    pub fn pages_completed(&self) -> u64 {
        self.pages_completed.load(Ordering::SeqCst)
    }

    pub fn pages_failed(&self) -> u64 {
        self.pages_failed.load(Ordering::SeqCst)
    }

    pub fn robots_denials(&self) -> u64 {
        self.robots_denied.load(Ordering::SeqCst)
    }

    pub fn active_workers(&self) -> usize {
        self.active_workers.load(Ordering::SeqCst)
    }

    /// Returns true once the page budget is used up by completed pages
    pub fn limit_reached(&self) -> bool {
        self.pages_completed() >= self.max_pages
    }
}

/// One page of the budget held by a unit of work
#[derive(Debug)]
pub struct PageClaim {
    session: Arc<CrawlSession>,
    completed: bool,
}

impl PageClaim {
    /// Counts the claimed page as completed
    ///
    /// Returns true when this page completes the budget.
    pub fn complete(mut self) -> bool {
        self.completed = true;
        self.session.page_completed()
    }
}

impl Drop for PageClaim {
    fn drop(&mut self) {
        if !self.completed {
            self.session.release_page();
        }
    }
}
