use url::Url;

/// Extracts the politeness key of a URL
///
/// The key is the lowercase host, followed by `:port` when the URL carries a
/// non-default port. Two servers on the same machine but different ports are
/// separate hosts for robots.txt and rate limiting.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use tide_frontier::url::extract_host;
///
/// let url = Url::parse("https://EXAMPLE.com/path").unwrap();
/// assert_eq!(extract_host(&url), Some("example.com".to_string()));
///
/// let url = Url::parse("http://127.0.0.1:8080/").unwrap();
/// assert_eq!(extract_host(&url), Some("127.0.0.1:8080".to_string()));
/// ```
pub fn extract_host(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    match url.port() {
        Some(port) => Some(format!("{}:{}", host, port)),
        None => Some(host),
    }
}

/// Builds the robots.txt location for the site serving `url`
pub fn robots_url(url: &Url) -> Option<Url> {
    let mut robots = url.clone();
    robots.host_str()?;
    robots.set_path("/robots.txt");
    robots.set_query(None);
    robots.set_fragment(None);
    Some(robots)
}
