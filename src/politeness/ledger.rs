use crate::state::DomainState;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::trace;

/// Domain access ledger
///
/// Maps each host to its last reserved request slot. [`reserve`] is the only
/// writer: it reads the slot, computes the wait and commits the new slot under
/// one lock acquisition.
///
/// [`reserve`]: DomainLedger::reserve
#[derive(Debug, Default)]
pub struct DomainLedger {
    hosts: Mutex<HashMap<String, DomainState>>,
}

impl DomainLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves the next request slot for `host` and returns the wait until it
    pub fn reserve(&self, host: &str, min_interval: Duration) -> Duration {
        let now = Instant::now();
        let mut hosts = self.hosts.lock().unwrap_or_else(PoisonError::into_inner);
        let state = hosts.entry(host.to_string()).or_default();
        let wait = state.reserve(now, min_interval);

        trace!(
            host,
            wait_ms = wait.as_millis() as u64,
            requests = state.request_count,
            "Reserved request slot"
        );

        wait
    }

    /// Number of slots reserved for `host` so far
    pub fn request_count(&self, host: &str) -> u32 {
        let hosts = self.hosts.lock().unwrap_or_else(PoisonError::into_inner);
        hosts.get(host).map_or(0, |state| state.request_count)
    }

    /// Number of hosts seen in this run
    pub fn host_count(&self) -> usize {
        let hosts = self.hosts.lock().unwrap_or_else(PoisonError::into_inner);
        hosts.len()
    }
}
