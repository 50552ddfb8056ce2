//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `DomainState`: per-host slot reservations for rate limiting
//! - `WorkerState`: the dispatcher's per-worker state machine
//! - `CrawlSession`: run-wide counters and the page budget, claimed through `PageClaim`

mod domain_state;
mod session;
mod worker_state;

// Re-export main types
pub use domain_state::DomainState;
pub use session::{CrawlSession, PageClaim};
pub use worker_state::WorkerState;
