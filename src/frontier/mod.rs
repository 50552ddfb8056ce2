//! URL frontier
//!
//! The frontier holds records that have not been fetched yet, ordered by
//! priority and then by insertion. Every offered URL is normalized and checked
//! against the membership filter, so each URL is queued at most once per run
//! (up to the filter's false-positive rate).
//!
//! Besides plain [`Frontier::take`], workers use [`Frontier::checkout`] and
//! [`Frontier::settle`], which track records that have been handed out but
//! whose links have not been offered back yet. The frontier is drained only
//! when its queue is empty and nothing is checked out.

mod queue;
mod record;

pub use record::UrlRecord;

use crate::config::FrontierConfig;
use crate::filter::{BloomFilter, MembershipFilter};
use crate::url::UrlNormalizer;
use queue::PriorityQueue;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use tracing::debug;

/// Outcome of [`Frontier::checkout`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Checkout {
    /// A record to work on; must be returned with [`Frontier::settle`]
    Record(UrlRecord),

    /// Nothing queued, but checked-out records may still yield links
    Pending,

    /// Nothing queued and nothing checked out
    Drained,
}

/// Counters describing what happened to offered URLs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrontierStats {
    /// URLs queued
    pub accepted: u64,
    /// URLs rejected as already seen
    pub duplicates: u64,
    /// URLs rejected for exceeding the maximum depth
    pub too_deep: u64,
    /// URLs rejected because they could not be normalized
    pub invalid: u64,
}

#[derive(Debug, Default)]
struct Queue {
    records: PriorityQueue,
    checked_out: usize,
}

#[derive(Debug, Default)]
struct Counters {
    accepted: AtomicU64,
    duplicates: AtomicU64,
    too_deep: AtomicU64,
    invalid: AtomicU64,
}

/// Priority-ordered, deduplicated set of URLs waiting to be fetched
///
/// The membership filter and the queue sit behind separate locks and no
/// operation holds both at once.
pub struct Frontier {
    normalizer: UrlNormalizer,
    max_depth: u32,
    seen: Mutex<Box<dyn MembershipFilter>>,
    queue: Mutex<Queue>,
    counters: Counters,
}

impl Frontier {
    /// Creates a frontier with a Bloom filter sized from the configuration
    pub fn new(config: &FrontierConfig, max_depth: u32) -> Self {
        let filter = BloomFilter::with_rate(config.expected_urls, config.false_positive_rate);
        Self::with_filter(
            UrlNormalizer::new(config.strip_params.iter().cloned()),
            Box::new(filter),
            max_depth,
        )
    }

    /// Creates a frontier with an explicit normalizer and membership filter
    pub fn with_filter(
        normalizer: UrlNormalizer,
        filter: Box<dyn MembershipFilter>,
        max_depth: u32,
    ) -> Self {
        Self {
            normalizer,
            max_depth,
            seen: Mutex::new(filter),
            queue: Mutex::new(Queue::default()),
            counters: Counters::default(),
        }
    }

    /// Offers a URL for crawling
    ///
    /// Returns true if the URL was queued. Returns false, without error, when
    /// the depth exceeds the maximum, the URL cannot be normalized, or the
    /// URL was seen before. The depth check runs first so a too-deep URL is
    /// never recorded as seen.
    pub fn offer(&self, url: &str, depth: u32, priority: u32) -> bool {
        if depth > self.max_depth {
            self.counters.too_deep.fetch_add(1, Ordering::Relaxed);
            debug!(url, depth, max_depth = self.max_depth, "Rejected: too deep");
            return false;
        }

        let normalized = match self.normalizer.normalize(url) {
            Ok(normalized) => normalized,
            Err(e) => {
                self.counters.invalid.fetch_add(1, Ordering::Relaxed);
                debug!(url, error = %e, "Rejected: invalid URL");
                return false;
            }
        };

        let unseen = {
            let mut seen = self.seen.lock().unwrap_or_else(PoisonError::into_inner);
            seen.insert_if_absent(normalized.as_str())
        };

        if !unseen {
            self.counters.duplicates.fetch_add(1, Ordering::Relaxed);
            return false;
        }

        let record = UrlRecord::new(normalized, depth, priority);
        debug!(%record, "Queued");

        let mut queue = self.lock_queue();
        queue.records.push(record);
        self.counters.accepted.fetch_add(1, Ordering::Relaxed);
        true
    }

    /// Removes and returns the record with the lowest priority value
    pub fn take(&self) -> Option<UrlRecord> {
        self.lock_queue().records.pop()
    }

    /// Removes the next record and marks it checked out
    pub fn checkout(&self) -> Checkout {
        let mut queue = self.lock_queue();
        match queue.records.pop() {
            Some(record) => {
                queue.checked_out += 1;
                Checkout::Record(record)
            }
            None if queue.checked_out > 0 => Checkout::Pending,
            None => Checkout::Drained,
        }
    }

    /// Returns a checked-out record after its links have been offered
    ///
    /// Returns true if this leaves the frontier drained.
    pub fn settle(&self) -> bool {
        let mut queue = self.lock_queue();
        queue.checked_out = queue.checked_out.saturating_sub(1);
        queue.checked_out == 0 && queue.records.is_empty()
    }

    /// Returns true if no record is queued
    pub fn is_empty(&self) -> bool {
        self.lock_queue().records.is_empty()
    }

    /// Number of queued records
    pub fn len(&self) -> usize {
        self.lock_queue().records.len()
    }

    /// Number of records checked out and not yet settled
    pub fn checked_out(&self) -> usize {
        self.lock_queue().checked_out
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    pub fn stats(&self) -> FrontierStats {
        FrontierStats {
            accepted: self.counters.accepted.load(Ordering::Relaxed),
            duplicates: self.counters.duplicates.load(Ordering::Relaxed),
            too_deep: self.counters.too_deep.load(Ordering::Relaxed),
            invalid: self.counters.invalid.load(Ordering::Relaxed),
        }
    }

    /// Expected false-positive rate of the membership filter at its current load
    pub fn estimated_false_positive_rate(&self) -> f64 {
        let accepted = self.counters.accepted.load(Ordering::Relaxed) as usize;
        let seen = self.seen.lock().unwrap_or_else(PoisonError::into_inner);
        seen.estimated_false_positive_rate(accepted)
    }

    fn lock_queue(&self) -> std::sync::MutexGuard<'_, Queue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
