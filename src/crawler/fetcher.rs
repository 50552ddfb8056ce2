//! HTTP fetcher implementation
//!
//! The dispatcher and the politeness gate only see the [`Fetcher`] trait, so
//! tests and embedders can swap the transport. [`HttpFetcher`] is the reqwest
//! implementation used by the binary.

use crate::config::{CrawlerConfig, UserAgentConfig};
use crate::FetchError;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::{redirect::Policy, Client};
use std::time::Duration;
use url::Url;

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml";
const ACCEPT_LANGUAGES: &str = "zh-CN,zh;q=0.9,en;q=0.8";

/// A successfully fetched response
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub final_url: Url,

    /// HTTP status code (always 2xx)
    pub status: u16,

    /// Response headers
    pub headers: HeaderMap,

    /// Response body decoded as text
    pub body: String,
}

impl FetchedPage {
    /// Content-Type header value, if present
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }
}

/// Fetch capability consumed by the crawler
///
/// Implementations apply their own timeout and redirect policy. Any outcome
/// other than a 2xx response with a readable body is a [`FetchError`].
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &Url, user_agent: &str) -> Result<FetchedPage, FetchError>;
}

/// Builds an HTTP client with the crawler's timeout and redirect policy
///
/// # Example
///
/// ```no_run
/// use tide_frontier::config::{CrawlerConfig, UserAgentConfig};
/// use tide_frontier::crawler::build_http_client;
///
/// let client = build_http_client(&CrawlerConfig::default(), &UserAgentConfig::default()).unwrap();
/// ```
pub fn build_http_client(
    crawler: &CrawlerConfig,
    user_agent: &UserAgentConfig,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(Duration::from_secs(crawler.request_timeout_secs))
        .connect_timeout(Duration::from_secs(crawler.request_timeout_secs.min(10)))
        .redirect(Policy::limited(crawler.max_redirects))
        .gzip(true)
        .brotli(true)
        .build()
}

/// reqwest-backed [`Fetcher`]
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Wraps an already configured client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds a fetcher from the crawler configuration
    pub fn from_config(
        crawler: &CrawlerConfig,
        user_agent: &UserAgentConfig,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self::new(build_http_client(crawler, user_agent)?))
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url, user_agent: &str) -> Result<FetchedPage, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .header(USER_AGENT, user_agent)
            .header(ACCEPT, ACCEPT_HTML)
            .header(ACCEPT_LANGUAGE, ACCEPT_LANGUAGES)
            .send()
            .await
            .map_err(|e| classify_error(url, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = response.url().clone();
        let headers = response.headers().clone();
        let body = response.text().await.map_err(|e| FetchError::Body {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        Ok(FetchedPage {
            final_url,
            status: status.as_u16(),
            headers,
            body,
        })
    }
}

/// Maps a transport error onto the crawl's error taxonomy
fn classify_error(url: &Url, error: &reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else if error.is_connect() {
        FetchError::Network {
            url: url.to_string(),
            message: "Connection refused".to_string(),
        }
    } else if error.is_redirect() {
        FetchError::Network {
            url: url.to_string(),
            message: "Too many redirects".to_string(),
        }
    } else {
        FetchError::Network {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}
