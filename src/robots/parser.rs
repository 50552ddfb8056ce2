//! Robots.txt parser implementation
//!
//! Line parsing is done by the robotstxt crate; this module collects the
//! groups it reports and keeps the rules for one user agent. Only the
//! directives the crawler acts on are kept: `User-agent`, `Allow`,
//! `Disallow` and `Crawl-delay`.

use crate::config::TieBreak;
use robotstxt::matcher::{LongestMatchRobotsMatchStrategy, RobotsMatchStrategy};
use robotstxt::{parse_robotstxt, RobotsParseHandler};
use std::time::Duration;
use url::Url;

/// Longest crawl delay honoured; larger values are clamped to it
pub const MAX_CRAWL_DELAY: Duration = Duration::from_secs(60 * 60);

/// A single allow or disallow rule
#[derive(Debug, Clone, PartialEq, Eq)]
struct Rule {
    pattern: String,
    allow: bool,
}

/// A `User-agent` group with the rules that follow it
#[derive(Debug, Default)]
struct Group {
    agents: Vec<String>,
    rules: Vec<Rule>,
    crawl_delay: Option<Duration>,
}

/// Receives parsed lines and splits them into user-agent groups
#[derive(Debug, Default)]
struct GroupCollector {
    groups: Vec<Group>,
    current: Group,
    // A User-agent line after rules starts a new group
    seen_rule: bool,
}

impl GroupCollector {
    fn push_rule(&mut self, value: &str, allow: bool) {
        self.seen_rule = true;
        // An empty Disallow means "nothing is disallowed"
        if !value.is_empty() && !self.current.agents.is_empty() {
            self.current.rules.push(Rule {
                pattern: escape_pattern(value),
                allow,
            });
        }
    }

    fn finish(mut self) -> Vec<Group> {
        if !self.current.agents.is_empty() {
            self.groups.push(self.current);
        }
        self.groups
    }
}

impl RobotsParseHandler for GroupCollector {
    fn handle_robots_start(&mut self) {}

    fn handle_robots_end(&mut self) {}

    fn handle_user_agent(&mut self, _line_num: u32, user_agent: &str) {
        if self.seen_rule {
            self.groups.push(std::mem::take(&mut self.current));
            self.seen_rule = false;
        }
        let agent = if user_agent.starts_with('*') {
            "*".to_string()
        } else {
            agent_token(user_agent)
        };
        // `User-agent:` with no name names nobody
        if !agent.is_empty() {
            self.current.agents.push(agent);
        }
    }

    fn handle_allow(&mut self, _line_num: u32, value: &str) {
        self.push_rule(value, true);
    }

    fn handle_disallow(&mut self, _line_num: u32, value: &str) {
        self.push_rule(value, false);
    }

    fn handle_sitemap(&mut self, _line_num: u32, _value: &str) {}

    fn handle_unknown_action(&mut self, _line_num: u32, action: &str, value: &str) {
        if action.trim().eq_ignore_ascii_case("crawl-delay") {
            self.seen_rule = true;
            if let Some(delay) = parse_crawl_delay(value) {
                self.current.crawl_delay = Some(delay);
            }
        }
    }
}

/// Robots.txt rules that apply to one user agent
///
/// Built from the group naming the crawler's product token if there is one,
/// otherwise from the `*` group. A policy with no rules allows everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RobotsPolicy {
    rules: Vec<Rule>,
    crawl_delay: Option<Duration>,
}

impl RobotsPolicy {
    /// Parses robots.txt content for the given user agent
    ///
    /// The user agent may be a full header value such as
    /// `TideBot/1.0 (+https://example.com/bot)`; only its product token
    /// (`tidebot`) is matched against `User-agent` lines.
    pub fn parse(content: &str, user_agent: &str) -> Self {
        let token = agent_token(user_agent);

        let mut collector = GroupCollector::default();
        parse_robotstxt(content, &mut collector);
        let groups = collector.finish();

        let specific: Vec<&Group> = groups
            .iter()
            .filter(|g| !token.is_empty() && g.agents.iter().any(|agent| *agent == token))
            .collect();

        let selected = if specific.is_empty() {
            groups
                .iter()
                .filter(|g| g.agents.iter().any(|agent| agent == "*"))
                .collect()
        } else {
            specific
        };

        let mut policy = Self::default();
        for group in selected {
            policy.rules.extend(group.rules.iter().cloned());
            policy.crawl_delay = match (policy.crawl_delay, group.crawl_delay) {
                (Some(a), Some(b)) => Some(a.max(b)),
                (a, b) => a.or(b),
            };
        }
        policy
    }

    /// Creates a permissive policy that allows everything
    ///
    /// This is used when robots.txt cannot be fetched or is not honoured.
    pub fn unrestricted() -> Self {
        Self::default()
    }

    /// Returns true if the policy holds no rules at all
    pub fn is_unrestricted(&self) -> bool {
        self.rules.is_empty() && self.crawl_delay.is_none()
    }

    /// The crawl delay requested for this user agent, if any
    pub fn crawl_delay(&self) -> Option<Duration> {
        self.crawl_delay
    }

    /// Checks whether a URL may be fetched
    pub fn is_allowed(&self, url: &Url, tie_break: TieBreak) -> bool {
        let mut target = url.path().to_string();
        if let Some(query) = url.query() {
            target.push('?');
            target.push_str(query);
        }
        self.is_path_allowed(&target, tie_break)
    }

    /// Checks whether a path (with optional `?query`) may be fetched
    ///
    /// The longest matching rule decides. When an allow and a disallow rule
    /// match with the same length, `tie_break` decides. No matching rule
    /// means allowed.
    pub fn is_path_allowed(&self, path: &str, tie_break: TieBreak) -> bool {
        let path = escape_pattern(path);
        let mut longest_allow: Option<usize> = None;
        let mut longest_disallow: Option<usize> = None;

        for rule in &self.rules {
            if !LongestMatchRobotsMatchStrategy::matches(&path, &rule.pattern) {
                continue;
            }
            let slot = if rule.allow {
                &mut longest_allow
            } else {
                &mut longest_disallow
            };
            *slot = Some(slot.map_or(rule.pattern.len(), |len| len.max(rule.pattern.len())));
        }

        match (longest_allow, longest_disallow) {
            (_, None) => true,
            (None, Some(_)) => false,
            (Some(allow), Some(disallow)) if allow == disallow => tie_break == TieBreak::Allow,
            (Some(allow), Some(disallow)) => allow > disallow,
        }
    }
}

/// Reads a `Crawl-delay` value in seconds
///
/// Negative and non-numeric values are dropped. Values too large for a
/// `Duration`, or above [`MAX_CRAWL_DELAY`], are clamped.
fn parse_crawl_delay(value: &str) -> Option<Duration> {
    let seconds = value.trim().parse::<f64>().ok()?;
    if seconds.is_nan() || seconds < 0.0 {
        return None;
    }
    let delay = Duration::try_from_secs_f64(seconds).unwrap_or(MAX_CRAWL_DELAY);
    Some(delay.min(MAX_CRAWL_DELAY))
}

/// Lowercase product token of a User-Agent value
///
/// `TideBot/1.0 (+https://x.y)` gives `tidebot`.
fn agent_token(user_agent: &str) -> String {
    user_agent
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect::<String>()
        .to_ascii_lowercase()
}

/// Percent-encodes non-ASCII bytes and uppercases existing escapes
///
/// Applied to both patterns and paths so `/ü` and `/%c3%bc` compare equal
/// to the `/%C3%BC` a parsed `Url` carries.
fn escape_pattern(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut escaped = String::with_capacity(raw.len());
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if b == b'%'
            && i + 2 < bytes.len()
            && bytes[i + 1].is_ascii_hexdigit()
            && bytes[i + 2].is_ascii_hexdigit()
        {
            escaped.push('%');
            escaped.push(bytes[i + 1].to_ascii_uppercase() as char);
            escaped.push(bytes[i + 2].to_ascii_uppercase() as char);
            i += 3;
        } else if b.is_ascii() {
            escaped.push(b as char);
            i += 1;
        } else {
            escaped.push_str(&format!("%{:02X}", b));
            i += 1;
        }
    }
    escaped
}
