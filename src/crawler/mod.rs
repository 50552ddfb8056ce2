//! Crawler module: fetching, parsing and running the worker pool
//!
//! This module contains:
//! - The [`Fetcher`] seam and its HTTP implementation
//! - The [`PageParser`] seam and HTML link extraction
//! - The dispatcher that drives workers against the frontier
//! - The [`Coordinator`] that runs one crawl and reports a [`CrawlSummary`]

mod coordinator;
mod dispatcher;
mod fetcher;
mod parser;
mod summary;

pub use coordinator::{run_crawl, Collaborators, Coordinator};
pub use fetcher::{build_http_client, FetchedPage, Fetcher, HttpFetcher};
pub use parser::{parse_html, DiscoveredLink, HtmlParser, PageParser, ParsedPage, BODY_TEXT_LIMIT};
pub use summary::{CrawlSummary, TerminationReason};
