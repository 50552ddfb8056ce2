//! SQLite-backed page sink
//!
//! Each run gets a row in `runs`; pages and their links are written as they
//! complete and the run's outcome is recorded by [`PageSink::finish`].

use crate::crawler::CrawlSummary;
use crate::output::{CrawledPage, OutputResult, PageSink};
use crate::storage::{SqliteStorage, Storage};
use std::path::Path;
use std::sync::{Mutex, PoisonError};
use tracing::debug;

/// Page sink writing to a SQLite database
pub struct SqliteSink {
    storage: Mutex<SqliteStorage>,
    run_id: i64,
}

impl SqliteSink {
    /// Opens the database at `path` and starts a new run
    pub fn open(path: &Path, config_hash: &str) -> OutputResult<Self> {
        Self::with_storage(SqliteStorage::new(path)?, config_hash)
    }

    /// Starts a new run in an already opened database
    pub fn with_storage(mut storage: SqliteStorage, config_hash: &str) -> OutputResult<Self> {
        let run_id = storage.create_run(config_hash)?;
        debug!(run_id, "Started run");

        Ok(Self {
            storage: Mutex::new(storage),
            run_id,
        })
    }

    pub fn run_id(&self) -> i64 {
        self.run_id
    }

    /// Runs `f` against the underlying storage
    pub fn with<T>(&self, f: impl FnOnce(&mut SqliteStorage) -> T) -> T {
        let mut storage = self.storage.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut storage)
    }
}

impl PageSink for SqliteSink {
    fn persist(&self, page: &CrawledPage) -> OutputResult<()> {
        self.with(|storage| storage.insert_page(self.run_id, page))?;
        Ok(())
    }

    fn finish(&self, summary: &CrawlSummary) -> OutputResult<()> {
        self.with(|storage| storage.finish_run(self.run_id, summary))?;
        Ok(())
    }
}
