//! Tide-Frontier: a polite, priority-driven web crawl frontier
//!
//! This crate decides in what order and at what rate a bounded pool of
//! concurrent workers fetches URLs from a growing, deduplicated candidate set,
//! while honouring robots.txt and per-host request intervals.

pub mod config;
pub mod crawler;
pub mod filter;
pub mod frontier;
pub mod output;
pub mod politeness;
pub mod robots;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Tide-Frontier operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Robots.txt error: {0}")]
    Policy(#[from] PolicyFetchError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors (the `InvalidURL` kind)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// A page could not be fetched
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("HTTP {status} for {url}")]
    Http { url: String, status: u16 },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Network error for {url}: {message}")]
    Network { url: String, message: String },

    #[error("Failed to read body of {url}: {message}")]
    Body { url: String, message: String },
}

/// robots.txt for a host could not be retrieved
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Failed to fetch robots.txt for {host}: {reason}")]
pub struct PolicyFetchError {
    pub host: String,
    pub reason: String,
}

/// A fetched body could not be parsed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("HTML parse error for {url}: {message}")]
pub struct ParseError {
    pub url: String,
    pub message: String,
}

/// Result type alias for Tide-Frontier operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{run_crawl, Coordinator, CrawlSummary, TerminationReason};
pub use frontier::{Frontier, UrlRecord};
pub use politeness::PolitenessGate;
pub use crate::url::{extract_host, UrlNormalizer};
