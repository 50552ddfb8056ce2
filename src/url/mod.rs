//! URL handling module for Tide-Frontier
//!
//! This module provides URL normalization and host extraction. Normalized
//! URLs are the identity the frontier deduplicates on; hosts are the key the
//! politeness gate rate-limits and caches robots.txt by.

mod domain;
mod normalize;

pub use domain::{extract_host, robots_url};
pub use normalize::UrlNormalizer;
