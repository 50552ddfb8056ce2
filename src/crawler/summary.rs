//! Completion summary of a crawl run

use crate::frontier::FrontierStats;
use chrono::{DateTime, Utc};
use std::fmt;
use std::time::Duration;

/// Why a crawl run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TerminationReason {
    /// Nothing left to fetch and no worker mid-unit
    FrontierExhausted,

    /// The configured page budget was used up
    PageLimitReached,

    /// The run was cancelled from outside
    Cancelled,

    /// A worker died with URLs still queued or checked out
    WorkerFailed,
}

impl TerminationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FrontierExhausted => "frontier_exhausted",
            Self::PageLimitReached => "page_limit_reached",
            Self::Cancelled => "cancelled",
            Self::WorkerFailed => "worker_failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "frontier_exhausted" => Some(Self::FrontierExhausted),
            "page_limit_reached" => Some(Self::PageLimitReached),
            "cancelled" => Some(Self::Cancelled),
            "worker_failed" => Some(Self::WorkerFailed),
            _ => None,
        }
    }
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What a finished run did
///
/// A summary is produced for every run, including runs where every fetch
/// failed and runs that were cancelled.
#[derive(Debug, Clone)]
pub struct CrawlSummary {
    pub started_at: DateTime<Utc>,
    pub duration: Duration,
    pub termination: TerminationReason,

    /// Pages fetched, parsed and handed to the sink
    pub pages_completed: u64,

    /// Pages whose fetch failed
    pub pages_failed: u64,

    /// URLs skipped because robots.txt disallows them
    pub robots_denied: u64,

    /// Records still queued when the run stopped
    pub frontier_remaining: usize,

    pub frontier: FrontierStats,

    /// Distinct hosts a request was admitted for
    pub hosts_contacted: usize,
}

impl CrawlSummary {
    /// Pages completed as a percentage of pages attempted
    pub fn success_rate(&self) -> f64 {
        let attempted = self.pages_completed + self.pages_failed;
        if attempted == 0 {
            return 0.0;
        }
        (self.pages_completed as f64 / attempted as f64) * 100.0
    }
}
