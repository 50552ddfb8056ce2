//! Storage module for persisting crawl data
//!
//! This module handles the SQLite database behind the `sqlite` output
//! format:
//! - Schema management
//! - Run bookkeeping (start, outcome, history)
//! - Page and link persistence

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::crawler::TerminationReason;
use std::path::Path;

/// Opens (creating if needed) a storage database
pub fn open_storage(path: &Path) -> StorageResult<SqliteStorage> {
    SqliteStorage::new(path)
}

/// Represents a crawl run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
    pub termination: Option<TerminationReason>,
    pub pages_completed: u64,
    pub pages_failed: u64,
    pub robots_denied: u64,
    pub duration_ms: Option<u64>,
}

/// Status of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Interrupted,
}

impl RunStatus {
    /// Status recorded for a run that stopped for `reason`
    pub fn for_termination(reason: TerminationReason) -> Self {
        match reason {
            TerminationReason::Cancelled | TerminationReason::WorkerFailed => Self::Interrupted,
            TerminationReason::FrontierExhausted | TerminationReason::PageLimitReached => {
                Self::Completed
            }
        }
    }

    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Interrupted => "interrupted",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "interrupted" => Some(Self::Interrupted),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_status_roundtrip() {
        for status in &[RunStatus::Running, RunStatus::Completed, RunStatus::Interrupted] {
            let parsed = RunStatus::from_db_string(status.to_db_string());
            assert_eq!(Some(*status), parsed);
        }
        assert_eq!(RunStatus::from_db_string("invalid"), None);
    }

    #[test]
    fn test_status_for_termination() {
        assert_eq!(
            RunStatus::for_termination(TerminationReason::Cancelled),
            RunStatus::Interrupted
        );
        assert_eq!(
            RunStatus::for_termination(TerminationReason::PageLimitReached),
            RunStatus::Completed
        );
        assert_eq!(
            RunStatus::for_termination(TerminationReason::WorkerFailed),
            RunStatus::Interrupted
        );
    }
}
