//! Robots.txt handling module
//!
//! This module provides parsing of robots.txt content into a per-agent
//! [`RobotsPolicy`] and the per-run [`RobotsCache`] the politeness gate
//! consults before every fetch.

mod cache;
mod parser;

pub use cache::{CachedRobots, RobotsCache};
pub use parser::RobotsPolicy;
