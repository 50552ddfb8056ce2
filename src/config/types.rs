use serde::Deserialize;

/// Main configuration structure for Tide-Frontier
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// URLs the crawl starts from (depth 0)
    pub seeds: Vec<String>,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub frontier: FrontierConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Builds a configuration with default settings for the given seeds
    pub fn with_seeds<I, S>(seeds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            seeds: seeds.into_iter().map(Into::into).collect(),
            crawler: CrawlerConfig::default(),
            user_agent: UserAgentConfig::default(),
            frontier: FrontierConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Maximum depth to crawl from seed URLs
    #[serde(rename = "max-depth")]
    pub max_depth: u32,

    /// Maximum number of successfully processed pages
    #[serde(rename = "max-pages")]
    pub max_pages: u64,

    /// Number of concurrent workers
    pub concurrency: u32,

    /// Minimum time between requests to the same host (milliseconds)
    #[serde(rename = "default-delay-ms")]
    pub default_delay_ms: u64,

    /// Whether robots.txt is fetched and honoured
    #[serde(rename = "respect-robots-txt")]
    pub respect_robots_txt: bool,

    /// Per-request deadline (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// Maximum redirect hops followed per request
    #[serde(rename = "max-redirects")]
    pub max_redirects: usize,

    /// How equal-length allow/disallow matches are resolved
    #[serde(rename = "robots-tie-break")]
    pub robots_tie_break: TieBreak,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_depth: 3,
            max_pages: 1000,
            concurrency: 5,
            default_delay_ms: 1000,
            respect_robots_txt: true,
            request_timeout_secs: 10,
            max_redirects: 5,
            robots_tie_break: TieBreak::Allow,
        }
    }
}

/// Resolution of an allow and a disallow rule matching with the same length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TieBreak {
    #[default]
    Allow,
    Disallow,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    pub name: String,

    /// Version of the crawler
    pub version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: Option<String>,
}

impl UserAgentConfig {
    /// Formats the User-Agent header value
    ///
    /// Format: `Name/Version` or `Name/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        match &self.contact_url {
            Some(contact) => format!("{}/{} (+{})", self.name, self.version, contact),
            None => format!("{}/{}", self.name, self.version),
        }
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            name: "MyCustomBot".to_string(),
            version: "1.0".to_string(),
            contact_url: None,
        }
    }
}

/// Frontier and deduplication configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FrontierConfig {
    /// Expected number of distinct URLs over the run (sizes the membership filter)
    #[serde(rename = "expected-urls")]
    pub expected_urls: usize,

    /// Target false-positive rate of the membership filter at the expected load
    #[serde(rename = "false-positive-rate")]
    pub false_positive_rate: f64,

    /// Query parameters removed during normalization
    #[serde(rename = "strip-params")]
    pub strip_params: Vec<String>,
}

impl Default for FrontierConfig {
    fn default() -> Self {
        Self {
            expected_urls: 10_000,
            false_positive_rate: 0.01,
            strip_params: DEFAULT_STRIP_PARAMS.iter().map(|p| p.to_string()).collect(),
        }
    }
}

/// Tracking and session parameters stripped when nothing else is configured
pub const DEFAULT_STRIP_PARAMS: &[&str] = &["utm_source", "utm_medium", "utm_campaign", "PHPSESSID"];

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Where processed pages are persisted
    pub format: OutputFormat,

    /// Directory for JSON page records
    pub directory: String,

    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Optional path of the markdown run summary
    #[serde(rename = "summary-path")]
    pub summary_path: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Json,
            directory: "./crawled_data".to_string(),
            database_path: "./crawl.db".to_string(),
            summary_path: None,
        }
    }
}

/// Page sink selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Sqlite,
    None,
}
