//! Worker slot states for the dispatcher
//!
//! A worker cycles `Idle -> Admitted -> Fetching -> Parsing -> Enqueuing -> Idle`
//! for each unit of work. Cancellation moves any worker to `Aborted`.
use std::fmt;

/// Represents the current state of a dispatcher worker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkerState {
    /// Waiting for a record from the frontier
    Idle,

    /// Holds a record and has been admitted by the politeness gate
    Admitted,

    /// Request is in flight
    Fetching,

    /// Body is being parsed
    Parsing,

    /// Discovered links are being offered back to the frontier
    Enqueuing,

    /// Stopped by cancellation (terminal)
    Aborted,
}

impl WorkerState {
    /// Returns true if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Aborted)
    }

    /// Returns true if the worker is in the middle of a unit of work
    pub fn is_busy(&self) -> bool {
        !matches!(self, Self::Idle | Self::Aborted)
    }

    /// Returns true if moving from `self` to `next` is a legal transition
    ///
    /// `Idle` may abort too: a worker waiting for work when the run is
    /// cancelled stops without starting a unit.
    pub fn can_transition_to(&self, next: WorkerState) -> bool {
        use WorkerState::*;

        match (self, next) {
            (Idle, Admitted)
            | (Admitted, Fetching)
            | (Fetching, Parsing)
            | (Parsing, Enqueuing)
            | (Enqueuing, Idle) => true,
            // A failed stage ends the unit early
            (Admitted | Fetching | Parsing, Idle) => true,
            (state, Aborted) => !state.is_terminal(),
            _ => false,
        }
    }

    /// Returns the lowercase name of the state
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Admitted => "admitted",
            Self::Fetching => "fetching",
            Self::Parsing => "parsing",
            Self::Enqueuing => "enqueuing",
            Self::Aborted => "aborted",
        }
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
