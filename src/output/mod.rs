//! Output module for persisting crawled pages and reporting runs
//!
//! This module handles:
//! - The [`PageSink`] contract the crawler hands each processed page to
//! - JSON-directory, SQLite, in-memory and discarding sinks
//! - Printing and writing completion summaries

mod json;
mod markdown;
mod memory;
mod sqlite_output;
pub mod stats;

pub use json::JsonDirectorySink;
pub use markdown::{format_markdown_summary, generate_markdown_summary};
pub use memory::{MemorySink, NullSink};
pub use sqlite_output::SqliteSink;
pub use stats::{print_run_history, print_summary};

use crate::config::{OutputConfig, OutputFormat};
use crate::crawler::{CrawlSummary, ParsedPage};
use crate::storage::StorageError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize page: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// A successfully processed page as handed to a sink
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawledPage {
    /// Normalized URL the page was requested under
    pub url: String,

    #[serde(skip)]
    pub host: String,

    pub crawl_time: DateTime<Utc>,

    pub depth: u32,

    #[serde(flatten)]
    pub data: ParsedPage,
}

/// Sink for completed pages
///
/// The crawler calls [`persist`] once per successfully processed page, from
/// any worker, and [`finish`] once when the run ends. A persist failure is
/// logged and does not stop the crawl.
///
/// [`persist`]: PageSink::persist
/// [`finish`]: PageSink::finish
pub trait PageSink: Send + Sync {
    fn persist(&self, page: &CrawledPage) -> OutputResult<()>;

    /// Called once with the run's summary
    fn finish(&self, _summary: &CrawlSummary) -> OutputResult<()> {
        Ok(())
    }
}

/// Builds the sink selected by the output configuration
///
/// `config_hash` is recorded with the run when the SQLite sink is used.
pub fn build_sink(config: &OutputConfig, config_hash: &str) -> OutputResult<Box<dyn PageSink>> {
    let sink: Box<dyn PageSink> = match config.format {
        OutputFormat::Json => Box::new(JsonDirectorySink::new(Path::new(&config.directory))?),
        OutputFormat::Sqlite => Box::new(SqliteSink::open(
            Path::new(&config.database_path),
            config_hash,
        )?),
        OutputFormat::None => Box::new(NullSink),
    };
    Ok(sink)
}
