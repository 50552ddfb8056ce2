//! Sinks that keep pages in memory or drop them

use crate::output::{CrawledPage, OutputResult, PageSink};
use std::sync::{Mutex, PoisonError};

/// Collects pages in memory
///
/// Useful when embedding the crawler and in tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    pages: Mutex<Vec<CrawledPage>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies of the pages persisted so far, in persist order
    pub fn pages(&self) -> Vec<CrawledPage> {
        self.pages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// URLs of the pages persisted so far
    pub fn urls(&self) -> Vec<String> {
        self.pages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|page| page.url.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.pages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PageSink for MemorySink {
    fn persist(&self, page: &CrawledPage) -> OutputResult<()> {
        self.pages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(page.clone());
        Ok(())
    }
}

/// Discards every page
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl PageSink for NullSink {
    fn persist(&self, _page: &CrawledPage) -> OutputResult<()> {
        Ok(())
    }
}
