use std::fmt;
use url::Url;

/// A queued URL with its crawl depth and priority
///
/// Lower priority values are fetched first. Records are immutable once
/// created; the frontier hands out clones of what was offered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlRecord {
    url: Url,
    depth: u32,
    priority: u32,
}

impl UrlRecord {
    pub(crate) fn new(url: Url, depth: u32, priority: u32) -> Self {
        Self {
            url,
            depth,
            priority,
        }
    }

    /// The normalized URL
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Hops from the nearest seed (seeds are depth 0)
    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn priority(&self) -> u32 {
        self.priority
    }

    /// Priority for a link discovered on a page at `depth`
    ///
    /// `depth + 1`, plus 2 when the link is marked nofollow so marked links
    /// are crawled later rather than dropped.
    pub fn link_priority(depth: u32, no_follow: bool) -> u32 {
        depth + 1 + if no_follow { 2 } else { 0 }
    }
}

impl fmt::Display for UrlRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (depth {}, priority {})",
            self.url, self.depth, self.priority
        )
    }
}
