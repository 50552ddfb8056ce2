//! HTML parser for extracting links and metadata
//!
//! This module handles parsing HTML content to extract:
//! - Links to follow, with anchor text and the nofollow marker
//! - Page title and meta description
//! - A plain-text excerpt of the body

use crate::ParseError;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use url::Url;

/// Maximum number of characters kept from the body text
pub const BODY_TEXT_LIMIT: usize = 1000;

/// A link found on a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveredLink {
    /// Absolute URL (http or https)
    pub url: String,

    /// Trimmed text content of the anchor
    pub anchor_text: String,

    /// Whether `rel` contains `nofollow`
    #[serde(rename = "nofollow")]
    pub no_follow: bool,
}

/// Extracted information from an HTML page
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedPage {
    /// The page title (from <title> tag)
    pub title: Option<String>,

    /// Content of `<meta name="description">`
    pub description: Option<String>,

    /// Whitespace-collapsed body text, truncated to [`BODY_TEXT_LIMIT`] characters
    #[serde(rename = "bodyText")]
    pub text: String,

    /// All followable links found on the page
    pub links: Vec<DiscoveredLink>,
}

/// Page parsing capability consumed by the crawler
///
/// A parse failure is never fatal: the crawler treats it as a page with no
/// links.
pub trait PageParser: Send + Sync {
    fn parse(&self, body: &str, base_url: &Url) -> Result<ParsedPage, ParseError>;
}

/// scraper-backed [`PageParser`]
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlParser;

impl PageParser for HtmlParser {
    fn parse(&self, body: &str, base_url: &Url) -> Result<ParsedPage, ParseError> {
        parse_html(body, base_url)
    }
}

/// Parses HTML content and extracts links and metadata
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` tags anywhere in the document
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs
/// - Fragment-only links
///
/// `rel="nofollow"` links are kept and flagged so the frontier can queue
/// them at a lower priority.
///
/// # Errors
///
/// Returns a [`ParseError`] for an empty body or one containing NUL bytes,
/// which indicates binary content served as a page.
///
/// # Example
///
/// ```
/// use tide_frontier::crawler::parse_html;
/// use url::Url;
///
/// let html = r#"<html><head><title>Test</title></head><body><a href="/page">Link</a></body></html>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let parsed = parse_html(html, &base_url).unwrap();
/// assert_eq!(parsed.title, Some("Test".to_string()));
/// assert_eq!(parsed.links[0].url, "https://example.com/page");
/// ```
pub fn parse_html(html: &str, base_url: &Url) -> Result<ParsedPage, ParseError> {
    if html.trim().is_empty() {
        return Err(ParseError {
            url: base_url.to_string(),
            message: "empty document".to_string(),
        });
    }

    if html.contains('\0') {
        return Err(ParseError {
            url: base_url.to_string(),
            message: "body is not text".to_string(),
        });
    }

    let document = Html::parse_document(html);

    Ok(ParsedPage {
        title: extract_title(&document),
        description: extract_description(&document),
        text: extract_body_text(&document),
        links: extract_links(&document, base_url),
    })
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn extract_description(document: &Html) -> Option<String> {
    let selector = Selector::parse(r#"meta[name="description"]"#).ok()?;

    document
        .select(&selector)
        .next()
        .and_then(|element| element.value().attr("content"))
        .map(|content| content.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn extract_body_text(document: &Html) -> String {
    let Ok(selector) = Selector::parse("body") else {
        return String::new();
    };

    let text = match document.select(&selector).next() {
        Some(body) => collapse_whitespace(&element_text(&body)),
        None => String::new(),
    };

    text.chars().take(BODY_TEXT_LIMIT).collect()
}

/// Extracts all followable links from the HTML document
fn extract_links(document: &Html, base_url: &Url) -> Vec<DiscoveredLink> {
    let mut links = Vec::new();

    let Ok(a_selector) = Selector::parse("a[href]") else {
        return links;
    };

    for element in document.select(&a_selector) {
        // Skip if it has the download attribute
        if element.value().attr("download").is_some() {
            continue;
        }

        let Some(url) = element
            .value()
            .attr("href")
            .and_then(|href| resolve_link(href, base_url))
        else {
            continue;
        };

        let no_follow = element
            .value()
            .attr("rel")
            .map(|rel| {
                rel.split_ascii_whitespace()
                    .any(|token| token.eq_ignore_ascii_case("nofollow"))
            })
            .unwrap_or(false);

        links.push(DiscoveredLink {
            url,
            anchor_text: collapse_whitespace(&element_text(&element)),
            no_follow,
        });
    }

    links
}

fn element_text(element: &ElementRef<'_>) -> String {
    element.text().collect::<Vec<_>>().join(" ")
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
    {
        return None;
    }

    let absolute_url = base_url.join(href).ok()?;
    match absolute_url.scheme() {
        "http" | "https" => Some(absolute_url.to_string()),
        _ => None,
    }
}
