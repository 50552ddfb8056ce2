//! Integration tests for Tide-Frontier
//!
//! These tests run full crawls against wiremock servers.

mod crawl_tests;
mod output_tests;

use std::sync::Arc;
use tide_frontier::config::{Config, OutputFormat};
use tide_frontier::crawler::{Collaborators, Coordinator, HtmlParser, HttpFetcher};
use tide_frontier::output::{MemorySink, PageSink};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Configuration for crawling a mock server with no politeness delay
pub fn test_config(seeds: &[String]) -> Config {
    let mut config = Config::with_seeds(seeds.iter().cloned());
    config.crawler.default_delay_ms = 0;
    config.crawler.concurrency = 4;
    config.crawler.request_timeout_secs = 5;
    config.user_agent.name = "TestBot".to_string();
    config.user_agent.version = "1.0".to_string();
    config.output.format = OutputFormat::None;
    config
}

/// Builds a coordinator using the real HTTP fetcher and an in-memory sink
pub fn http_coordinator(config: Config) -> (Coordinator, Arc<MemorySink>) {
    let fetcher = HttpFetcher::from_config(&config.crawler, &config.user_agent)
        .expect("Failed to build HTTP client");
    let sink = Arc::new(MemorySink::new());
    let collaborators = Collaborators {
        fetcher: Arc::new(fetcher),
        parser: Arc::new(HtmlParser),
        sink: Arc::clone(&sink) as Arc<dyn PageSink>,
    };
    let coordinator = Coordinator::new(config, collaborators).expect("Invalid test config");
    (coordinator, sink)
}

/// An HTML page linking to each of `hrefs`
pub fn html_page(title: &str, hrefs: &[&str]) -> String {
    let links: String = hrefs
        .iter()
        .map(|href| format!(r#"<a href="{}">{}</a>"#, href, href))
        .collect();
    format!(
        "<html><head><title>{}</title></head><body><p>{}</p>{}</body></html>",
        title, title, links
    )
}

/// Mounts a GET handler serving an HTML page
pub async fn mount_page(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

/// Mounts a robots.txt body
pub async fn mount_robots(server: &MockServer, body: &str) {
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// Mounts a small site: `/` links to `/page1` and `/page2`, `/page1` links to `/page3`
pub async fn mount_small_site(server: &MockServer) {
    mount_robots(server, "User-agent: *\nAllow: /\n").await;
    mount_page(server, "/", html_page("Home", &["/page1", "/page2"])).await;
    mount_page(server, "/page1", html_page("Page 1", &["/page3", "/"])).await;
    mount_page(server, "/page2", html_page("Page 2", &["/page1#top"])).await;
    mount_page(server, "/page3", html_page("Page 3", &[])).await;
}
