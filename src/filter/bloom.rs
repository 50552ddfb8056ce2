//! Bloom filter implementation of [`MembershipFilter`]

use super::MembershipFilter;
use bloomfilter::Bloom;
use std::fmt;

/// [`MembershipFilter`] backed by a `bloomfilter::Bloom` sized up front
pub struct BloomFilter {
    inner: Bloom<str>,
}

impl BloomFilter {
    /// Sizes a filter for `expected_items` at `false_positive_rate`
    ///
    /// # Examples
    ///
    /// ```
    /// use tide_frontier::filter::{BloomFilter, MembershipFilter};
    ///
    /// let mut filter = BloomFilter::with_rate(1_000, 0.01);
    /// filter.add("https://example.com/");
    /// assert!(filter.might_contain("https://example.com/"));
    /// assert!(filter.estimated_false_positive_rate(1_000) < 0.02);
    /// ```
    pub fn with_rate(expected_items: usize, false_positive_rate: f64) -> Self {
        let rate = false_positive_rate.clamp(f64::EPSILON, 0.999);
        Self {
            inner: Bloom::new_for_fp_rate(expected_items.max(1), rate),
        }
    }

    /// Number of bits in the array
    pub fn bit_count(&self) -> u64 {
        self.inner.number_of_bits()
    }

    /// Number of hash functions applied per key
    pub fn hash_count(&self) -> u32 {
        self.inner.number_of_hash_functions()
    }
}

impl fmt::Debug for BloomFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BloomFilter")
            .field("bit_count", &self.bit_count())
            .field("hash_count", &self.hash_count())
            .finish()
    }
}

impl MembershipFilter for BloomFilter {
    fn add(&mut self, key: &str) {
        self.inner.set(key);
    }

    fn might_contain(&self, key: &str) -> bool {
        self.inner.check(key)
    }

    fn estimated_false_positive_rate(&self, items_inserted: usize) -> f64 {
        // (1 - e^(-k n / m))^k
        let k = f64::from(self.hash_count());
        let n = items_inserted as f64;
        let m = self.bit_count() as f64;
        (1.0 - (-k * n / m).exp()).powf(k)
    }
}
