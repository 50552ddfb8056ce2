//! Probabilistic URL membership
//!
//! The frontier only needs to know whether a normalized URL has been seen
//! before. That question is answered through the [`MembershipFilter`] trait so
//! the size/accuracy tradeoff can be tuned or the structure swapped without
//! touching the frontier.

mod bloom;

pub use bloom::BloomFilter;

/// Set-membership test with no false negatives
///
/// Implementations only grow: there is no removal, and a key that was added
/// must be reported as present for the lifetime of the filter.
pub trait MembershipFilter: Send + Sync {
    /// Marks a key as seen. Idempotent.
    fn add(&mut self, key: &str);

    /// Returns `false` only if `key` was never added
    fn might_contain(&self, key: &str) -> bool;

    /// Expected false-positive rate after `items_inserted` distinct insertions
    ///
    /// Diagnostic only; never consulted when deciding membership.
    fn estimated_false_positive_rate(&self, items_inserted: usize) -> f64;

    /// Adds `key` and reports whether it was (probably) unseen before
    fn insert_if_absent(&mut self, key: &str) -> bool {
        if self.might_contain(key) {
            return false;
        }
        self.add(key);
        true
    }
}
