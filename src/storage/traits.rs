//! Storage traits and error types

use crate::crawler::CrawlSummary;
use crate::output::CrawledPage;
use crate::storage::RunRecord;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
pub trait Storage {
    // ===== Run Management =====

    /// Creates a new crawl run and returns its ID
    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64>;

    /// Records the outcome of a run
    fn finish_run(&mut self, run_id: i64, summary: &CrawlSummary) -> StorageResult<()>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    /// Lists all runs, newest first
    fn list_runs(&self) -> StorageResult<Vec<RunRecord>>;

    // ===== Page Management =====

    /// Stores a crawled page and its links, replacing an earlier copy from the same run
    fn insert_page(&mut self, run_id: i64, page: &CrawledPage) -> StorageResult<i64>;

    /// Number of pages stored for a run
    fn count_pages(&self, run_id: i64) -> StorageResult<u64>;

    /// URLs of the pages stored for a run, in insertion order
    fn page_urls(&self, run_id: i64) -> StorageResult<Vec<String>>;

    /// Number of links stored for a run
    fn count_links(&self, run_id: i64) -> StorageResult<u64>;
}
