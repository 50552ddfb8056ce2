//! Robots.txt caching implementation
//!
//! Entries are keyed by host and written once per run: the first fetch for a
//! host, successful or not, decides what every later lookup sees. Concurrent
//! lookups for a host that is not cached yet share a single fetch.

use crate::robots::RobotsPolicy;
use crate::PolicyFetchError;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::OnceCell;

/// Cached robots.txt outcome for a host
#[derive(Debug, Clone)]
pub enum CachedRobots {
    /// robots.txt was fetched and parsed
    Policy(Arc<RobotsPolicy>),

    /// robots.txt could not be fetched; the host is treated as unrestricted
    Unrestricted(PolicyFetchError),
}

impl CachedRobots {
    /// The policy to enforce for this entry
    pub fn policy(&self) -> Arc<RobotsPolicy> {
        match self {
            Self::Policy(policy) => Arc::clone(policy),
            Self::Unrestricted(_) => Arc::new(RobotsPolicy::unrestricted()),
        }
    }
}

/// Per-run robots.txt cache with fetch coalescing
#[derive(Debug, Default)]
pub struct RobotsCache {
    entries: Mutex<HashMap<String, Arc<OnceCell<CachedRobots>>>>,
}

impl RobotsCache {
    /// Creates an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached entry for `host`, running `fetch` on a miss
    ///
    /// `fetch` runs at most once per host even when many callers miss at the
    /// same time; the others wait for its result. The map lock is released
    /// before `fetch` is awaited.
    pub async fn get_or_fetch<F, Fut>(&self, host: &str, fetch: F) -> CachedRobots
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<RobotsPolicy, PolicyFetchError>>,
    {
        let cell = {
            let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(entries.entry(host.to_string()).or_default())
        };

        cell.get_or_init(|| async move {
            match fetch().await {
                Ok(policy) => CachedRobots::Policy(Arc::new(policy)),
                Err(e) => CachedRobots::Unrestricted(e),
            }
        })
        .await
        .clone()
    }

    /// Returns the cached entry for `host` without fetching
    pub fn get(&self, host: &str) -> Option<CachedRobots> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.get(host).and_then(|cell| cell.get().cloned())
    }

    /// Number of hosts with a settled entry
    pub fn len(&self) -> usize {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.values().filter(|cell| cell.initialized()).count()
    }

    /// Returns true if no host has a settled entry
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
