use std::time::Duration;
use tokio::time::Instant;

/// Per-host entry in the domain access ledger
///
/// Holds the slot of the most recently reserved request to the host. A slot
/// may lie in the future: it is the instant a worker was told it may send its
/// request, not the instant the request was observed on the wire.
#[derive(Debug, Clone, Default)]
pub struct DomainState {
    /// Number of requests reserved for this host in the current run
    pub request_count: u32,

    /// Slot of the last reserved request
    pub last_slot: Option<Instant>,
}

impl DomainState {
    /// Creates an entry with no reservations
    pub fn new() -> Self {
        Self::default()
    }

    /// Calculates the time until a request may be sent
    ///
    /// Returns `Duration::ZERO` when no request is outstanding or the minimum
    /// interval since the last slot has already elapsed.
    pub fn time_until_next_request(&self, now: Instant, min_interval: Duration) -> Duration {
        match self.last_slot {
            Some(last) => (last + min_interval).saturating_duration_since(now),
            None => Duration::ZERO,
        }
    }

    /// Reserves the next slot for this host and returns the wait until it
    ///
    /// The slot is recorded before returning, so a second caller sees the
    /// first caller's reservation and is queued one interval behind it.
    pub fn reserve(&mut self, now: Instant, min_interval: Duration) -> Duration {
        let wait = self.time_until_next_request(now, min_interval);
        self.last_slot = Some(now + wait);
        self.request_count += 1;
        wait
    }
}
