//! Politeness gate: robots.txt compliance and per-host rate limiting
//!
//! The gate owns the run's robots cache and domain access ledger. Workers ask
//! it whether a URL may be fetched at all ([`PolitenessGate::check_robots_policy`]
//! and [`PolitenessGate::is_allowed`]) and how long to wait before sending the
//! request ([`PolitenessGate::admit`]).

mod ledger;

pub use ledger::DomainLedger;

use crate::config::{CrawlerConfig, TieBreak, UserAgentConfig};
use crate::crawler::Fetcher;
use crate::robots::{CachedRobots, RobotsCache, RobotsPolicy};
use crate::url::{extract_host, robots_url};
use crate::PolicyFetchError;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Per-run politeness state shared by all workers
pub struct PolitenessGate {
    fetcher: Arc<dyn Fetcher>,
    robots: RobotsCache,
    ledger: DomainLedger,
    user_agent: String,
    default_delay: Duration,
    respect_robots: bool,
    tie_break: TieBreak,
}

impl PolitenessGate {
    /// Creates a gate fetching robots.txt through `fetcher`
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        crawler: &CrawlerConfig,
        user_agent: &UserAgentConfig,
    ) -> Self {
        Self {
            fetcher,
            robots: RobotsCache::new(),
            ledger: DomainLedger::new(),
            user_agent: user_agent.header_value(),
            default_delay: Duration::from_millis(crawler.default_delay_ms),
            respect_robots: crawler.respect_robots_txt,
            tie_break: crawler.robots_tie_break,
        }
    }

    /// Full User-Agent header value sent with requests
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Returns the robots policy for the URL's host
    ///
    /// The first lookup for a host fetches `/robots.txt`; concurrent lookups
    /// for the same host wait on that one fetch. A failed fetch is cached and
    /// reported as `Err` on every lookup, and callers should treat the host as
    /// unrestricted. With robots handling disabled no fetch is made.
    pub async fn check_robots_policy(
        &self,
        url: &Url,
    ) -> Result<Arc<RobotsPolicy>, PolicyFetchError> {
        if !self.respect_robots {
            return Ok(Arc::new(RobotsPolicy::unrestricted()));
        }

        let host = extract_host(url).ok_or_else(|| PolicyFetchError {
            host: String::new(),
            reason: format!("URL has no host: {}", url),
        })?;

        let entry = self
            .robots
            .get_or_fetch(&host, || self.fetch_robots(url, &host))
            .await;

        match entry {
            CachedRobots::Policy(policy) => Ok(policy),
            CachedRobots::Unrestricted(e) => Err(e),
        }
    }

    /// Like [`check_robots_policy`], treating a failed fetch as unrestricted
    ///
    /// [`check_robots_policy`]: PolitenessGate::check_robots_policy
    pub async fn policy_for(&self, url: &Url) -> Arc<RobotsPolicy> {
        match self.check_robots_policy(url).await {
            Ok(policy) => policy,
            Err(_) => Arc::new(RobotsPolicy::unrestricted()),
        }
    }

    /// Checks a URL against a host policy using the configured tie-break
    pub fn is_allowed(&self, url: &Url, policy: &RobotsPolicy) -> bool {
        policy.is_allowed(url, self.tie_break)
    }

    /// Minimum interval between requests to a host governed by `policy`
    pub fn min_interval(&self, policy: &RobotsPolicy) -> Duration {
        match policy.crawl_delay() {
            Some(delay) => delay.max(self.default_delay),
            None => self.default_delay,
        }
    }

    /// Reserves a request slot for `host` and returns how long to wait for it
    pub fn admit(&self, host: &str, policy: &RobotsPolicy) -> Duration {
        self.ledger.reserve(host, self.min_interval(policy))
    }

    /// Number of hosts with a settled robots.txt entry
    pub fn robots_cached(&self) -> usize {
        self.robots.len()
    }

    /// Number of requests admitted for `host` so far
    pub fn requests_admitted(&self, host: &str) -> u32 {
        self.ledger.request_count(host)
    }

    /// Number of distinct hosts that have been admitted at least once
    pub fn hosts_contacted(&self) -> usize {
        self.ledger.host_count()
    }

    async fn fetch_robots(&self, url: &Url, host: &str) -> Result<RobotsPolicy, PolicyFetchError> {
        let robots = robots_url(url).ok_or_else(|| PolicyFetchError {
            host: host.to_string(),
            reason: "cannot build robots.txt URL".to_string(),
        })?;

        match self.fetcher.fetch(&robots, &self.user_agent).await {
            Ok(page) => {
                let policy = RobotsPolicy::parse(&page.body, &self.user_agent);
                debug!(
                    host,
                    crawl_delay = ?policy.crawl_delay(),
                    "Fetched robots.txt"
                );
                Ok(policy)
            }
            Err(e) => {
                warn!(host, error = %e, "Could not fetch robots.txt, treating host as unrestricted");
                Err(PolicyFetchError {
                    host: host.to_string(),
                    reason: e.to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::FetchedPage;
    use crate::FetchError;
    use async_trait::async_trait;
    use reqwest::header::HeaderMap;
    use std::sync::Mutex;

    /// Serves a fixed robots.txt body, or fails when none is given
    struct RobotsFetcher {
        body: Option<String>,
        requests: Mutex<Vec<String>>,
    }

    impl RobotsFetcher {
        fn serving(body: &str) -> Arc<Self> {
            Arc::new(Self {
                body: Some(body.to_string()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                body: None,
                requests: Mutex::new(Vec::new()),
            })
        }

        fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Fetcher for RobotsFetcher {
        async fn fetch(&self, url: &Url, _user_agent: &str) -> Result<FetchedPage, FetchError> {
            self.requests.lock().unwrap().push(url.to_string());
            tokio::task::yield_now().await;

            match &self.body {
                Some(body) => Ok(FetchedPage {
                    final_url: url.clone(),
                    status: 200,
                    headers: HeaderMap::new(),
                    body: body.clone(),
                }),
                None => Err(FetchError::Http {
                    url: url.to_string(),
                    status: 500,
                }),
            }
        }
    }

    fn crawler_config(delay_ms: u64) -> CrawlerConfig {
        CrawlerConfig {
            default_delay_ms: delay_ms,
            ..CrawlerConfig::default()
        }
    }

    fn gate(fetcher: Arc<RobotsFetcher>, crawler: CrawlerConfig) -> PolitenessGate {
        let user_agent = UserAgentConfig {
            name: "TestBot".to_string(),
            ..UserAgentConfig::default()
        };
        PolitenessGate::new(fetcher, &crawler, &user_agent)
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_disallowed_path() {
        let fetcher = RobotsFetcher::serving("User-agent: *\nDisallow: /private");
        let gate = gate(fetcher.clone(), crawler_config(0));

        let target = url("https://example.com/private/page");
        let policy = gate.check_robots_policy(&target).await.unwrap();

        assert!(!gate.is_allowed(&target, &policy));
        assert!(gate.is_allowed(&url("https://example.com/public"), &policy));
        assert_eq!(
            fetcher.requests.lock().unwrap()[0],
            "https://example.com/robots.txt"
        );
    }

    #[tokio::test]
    async fn test_concurrent_checks_fetch_once() {
        let fetcher = RobotsFetcher::serving("User-agent: *\nDisallow: /private");
        let gate = Arc::new(gate(fetcher.clone(), crawler_config(0)));

        let handles: Vec<_> = (0..10)
            .map(|i| {
                let gate = Arc::clone(&gate);
                tokio::spawn(async move {
                    let target = url(&format!("https://example.com/page{}", i));
                    gate.check_robots_policy(&target).await.is_ok()
                })
            })
            .collect();

        for handle in handles {
            assert!(handle.await.unwrap());
        }

        assert_eq!(fetcher.request_count(), 1);
        assert_eq!(gate.robots_cached(), 1);
    }

    #[tokio::test]
    async fn test_fetch_failure_is_unrestricted_and_cached() {
        let fetcher = RobotsFetcher::failing();
        let gate = gate(fetcher.clone(), crawler_config(0));
        let target = url("https://down.example/anything");

        let first = gate.check_robots_policy(&target).await;
        assert_eq!(first.unwrap_err().host, "down.example");

        let policy = gate.policy_for(&target).await;
        assert!(policy.is_unrestricted());
        assert!(gate.is_allowed(&target, &policy));
        assert_eq!(fetcher.request_count(), 1);
    }

    #[tokio::test]
    async fn test_robots_disabled_skips_fetch() {
        let fetcher = RobotsFetcher::serving("User-agent: *\nDisallow: /");
        let crawler = CrawlerConfig {
            respect_robots_txt: false,
            ..CrawlerConfig::default()
        };
        let gate = gate(fetcher.clone(), crawler);

        let target = url("https://example.com/page");
        let policy = gate.check_robots_policy(&target).await.unwrap();

        assert!(gate.is_allowed(&target, &policy));
        assert_eq!(fetcher.request_count(), 0);
    }

    #[tokio::test]
    async fn test_crawl_delay_widens_interval() {
        let fetcher = RobotsFetcher::serving("User-agent: *\nCrawl-delay: 2");
        let gate = gate(fetcher, crawler_config(1000));

        let policy = gate.policy_for(&url("https://example.com/")).await;
        assert_eq!(gate.min_interval(&policy), Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_small_crawl_delay_keeps_default() {
        let fetcher = RobotsFetcher::serving("User-agent: *\nCrawl-delay: 0.5");
        let gate = gate(fetcher, crawler_config(1000));

        let policy = gate.policy_for(&url("https://example.com/")).await;
        assert_eq!(gate.min_interval(&policy), Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_admits_are_serialized() {
        let gate = Arc::new(gate(RobotsFetcher::failing(), crawler_config(1000)));
        let policy = Arc::new(RobotsPolicy::unrestricted());

        let a = {
            let (gate, policy) = (Arc::clone(&gate), Arc::clone(&policy));
            tokio::spawn(async move { gate.admit("example.com", &policy) })
        };
        let b = {
            let (gate, policy) = (Arc::clone(&gate), Arc::clone(&policy));
            tokio::spawn(async move { gate.admit("example.com", &policy) })
        };

        let (a, b) = (a.await.unwrap(), b.await.unwrap());
        let gap = if a > b { a - b } else { b - a };

        assert!(gap >= Duration::from_secs(1));
        assert_eq!(gate.requests_admitted("example.com"), 2);
    }

    #[tokio::test]
    async fn test_user_agent_token_selects_group() {
        let fetcher = RobotsFetcher::serving(
            "User-agent: TestBot\nDisallow: /only-for-testbot\n\nUser-agent: *\nDisallow: /",
        );
        let gate = gate(fetcher, crawler_config(0));

        let target = url("https://example.com/page");
        let policy = gate.policy_for(&target).await;

        assert!(gate.is_allowed(&target, &policy));
        assert!(!gate.is_allowed(&url("https://example.com/only-for-testbot"), &policy));
    }
}
