use crate::config::DEFAULT_STRIP_PARAMS;
use crate::UrlError;
use url::form_urlencoded;
use url::Url;

/// Canonicalizes raw URL strings into a comparable form
///
/// # Normalization Steps
///
/// 1. Parse the URL (optionally resolving it against a base); reject if malformed
/// 2. Reject schemes other than http and https
/// 3. Lowercase the host (done by the parser) and require one to be present
/// 4. Normalize path:
///    - Remove dot segments (. and ..)
///    - Collapse repeated slashes
///    - Remove trailing slash (except for root /)
///    - Empty path becomes /
/// 5. Remove fragment (everything after #)
/// 6. Remove configured query parameters
/// 7. Sort remaining query parameters by key, then value
/// 8. Remove empty query string (trailing ?)
///
/// A strip entry ending in `*` removes every parameter with that prefix, so
/// `utm_*` covers the whole utm family.
#[derive(Debug, Clone)]
pub struct UrlNormalizer {
    strip_params: Vec<String>,
}

impl UrlNormalizer {
    /// Creates a normalizer stripping the given query parameters
    pub fn new<I, S>(strip_params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            strip_params: strip_params.into_iter().map(Into::into).collect(),
        }
    }

    /// Normalizes an absolute URL
    ///
    /// # Examples
    ///
    /// ```
    /// use tide_frontier::url::UrlNormalizer;
    ///
    /// let normalizer = UrlNormalizer::default();
    /// let url = normalizer.normalize("https://EXAMPLE.com/a/?b=2&a=1&utm_source=x#top").unwrap();
    /// assert_eq!(url.as_str(), "https://example.com/a?a=1&b=2");
    /// ```
    pub fn normalize(&self, url_str: &str) -> Result<Url, UrlError> {
        let url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;
        self.canonicalize(url)
    }

    /// Normalizes a possibly relative URL resolved against `base`
    pub fn normalize_with_base(&self, url_str: &str, base: &Url) -> Result<Url, UrlError> {
        let url = base
            .join(url_str.trim())
            .map_err(|e| UrlError::Parse(e.to_string()))?;
        self.canonicalize(url)
    }

    fn canonicalize(&self, mut url: Url) -> Result<Url, UrlError> {
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(UrlError::InvalidScheme(url.scheme().to_string()));
        }

        match url.host_str() {
            Some(host) if !host.is_empty() => {}
            _ => return Err(UrlError::MissingHost),
        }

        let normalized_path = normalize_path(url.path());
        url.set_path(&normalized_path);

        url.set_fragment(None);

        if url.query().is_some() {
            let params = self.filter_and_sort_query_params(&url);

            if params.is_empty() {
                url.set_query(None);
            } else {
                let query = form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(params.iter())
                    .finish();
                url.set_query(Some(&query));
            }
        }

        Ok(url)
    }

    /// Filters out stripped parameters and sorts the remainder
    fn filter_and_sort_query_params(&self, url: &Url) -> Vec<(String, String)> {
        let mut params: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| !self.is_stripped(key))
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        params.sort();
        params
    }

    fn is_stripped(&self, key: &str) -> bool {
        self.strip_params.iter().any(|param| match param.strip_suffix('*') {
            Some(prefix) => key.starts_with(prefix),
            None => key == param,
        })
    }
}

impl Default for UrlNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_STRIP_PARAMS.iter().copied())
    }
}

/// Normalizes a URL path by removing dot segments and trailing slashes
fn normalize_path(path: &str) -> String {
    if path.is_empty() {
        return "/".to_string();
    }

    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            // Empty segments come from repeated slashes
            "" | "." => continue,
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }

    if segments.is_empty() {
        return "/".to_string();
    }

    format!("/{}", segments.join("/"))
}
