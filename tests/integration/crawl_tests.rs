use crate::{html_page, http_coordinator, mount_page, mount_robots, mount_small_site, test_config};
use std::time::{Duration, Instant};
use tide_frontier::crawler::TerminationReason;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_full_crawl_single_host() {
    let server = MockServer::start().await;
    mount_small_site(&server).await;

    let (coordinator, sink) = http_coordinator(test_config(&[format!("{}/", server.uri())]));
    let summary = coordinator.run().await;

    assert_eq!(summary.termination, TerminationReason::FrontierExhausted);
    assert_eq!(summary.pages_completed, 4);
    assert_eq!(summary.pages_failed, 0);
    assert_eq!(summary.frontier_remaining, 0);
    assert_eq!(summary.hosts_contacted, 1);

    let pages = sink.pages();
    assert_eq!(pages.len(), 4);

    let home = pages
        .iter()
        .find(|page| page.url == format!("{}/", server.uri()))
        .expect("home page missing");
    assert_eq!(home.depth, 0);
    assert_eq!(home.data.title.as_deref(), Some("Home"));
    assert_eq!(home.data.links.len(), 2);

    let page3 = pages
        .iter()
        .find(|page| page.url.ends_with("/page3"))
        .expect("page3 missing");
    assert_eq!(page3.depth, 2);
}

#[tokio::test]
async fn test_each_url_is_fetched_once() {
    let server = MockServer::start().await;
    mount_robots(&server, "").await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(html_page(
            "Home",
            &["/a", "/a/", "/a?utm_source=x", "/a#frag", "/A"],
        )))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(ResponseTemplate::new(200).set_body_string(html_page("A", &["/"])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/A"))
        .respond_with(ResponseTemplate::new(200).set_body_string(html_page("Upper A", &[])))
        .expect(1)
        .mount(&server)
        .await;

    let (coordinator, _sink) = http_coordinator(test_config(&[format!("{}/", server.uri())]));
    let summary = coordinator.run().await;

    assert_eq!(summary.pages_completed, 3);
    assert!(summary.frontier.duplicates >= 3);
    server.verify().await;
}

#[tokio::test]
async fn test_robots_disallowed_path_is_never_fetched() {
    let server = MockServer::start().await;
    mount_robots(&server, "User-agent: *\nDisallow: /private\n").await;
    mount_page(&server, "/", html_page("Home", &["/private/secret", "/public"])).await;
    mount_page(&server, "/public", html_page("Public", &[])).await;

    Mock::given(method("GET"))
        .and(path("/private/secret"))
        .respond_with(ResponseTemplate::new(200).set_body_string("secret"))
        .expect(0)
        .mount(&server)
        .await;

    let (coordinator, sink) = http_coordinator(test_config(&[format!("{}/", server.uri())]));
    let summary = coordinator.run().await;

    assert_eq!(summary.pages_completed, 2);
    assert_eq!(summary.robots_denied, 1);
    assert!(sink.urls().iter().all(|url| !url.contains("/private")));
    server.verify().await;
}

#[tokio::test]
async fn test_robots_txt_is_fetched_once_per_host() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nAllow: /\n"))
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/", html_page("Home", &["/1", "/2", "/3", "/4", "/5"])).await;
    for route in ["/1", "/2", "/3", "/4", "/5"] {
        mount_page(&server, route, html_page(route, &[])).await;
    }

    let mut config = test_config(&[format!("{}/", server.uri())]);
    config.crawler.concurrency = 5;
    let (coordinator, _sink) = http_coordinator(config);
    let summary = coordinator.run().await;

    assert_eq!(summary.pages_completed, 6);
    server.verify().await;
}

#[tokio::test]
async fn test_missing_robots_txt_means_unrestricted() {
    let server = MockServer::start().await;
    mount_page(&server, "/", html_page("Home", &["/next"])).await;
    mount_page(&server, "/next", html_page("Next", &[])).await;

    let (coordinator, _sink) = http_coordinator(test_config(&[format!("{}/", server.uri())]));
    let summary = coordinator.run().await;

    assert_eq!(summary.pages_completed, 2);
    assert_eq!(summary.robots_denied, 0);
}

#[tokio::test]
async fn test_user_agent_header_is_sent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("user-agent", "TestBot/1.0"))
        .respond_with(ResponseTemplate::new(200).set_body_string(html_page("Home", &[])))
        .expect(1)
        .mount(&server)
        .await;

    let (coordinator, _sink) = http_coordinator(test_config(&[format!("{}/", server.uri())]));
    let summary = coordinator.run().await;

    assert_eq!(summary.pages_completed, 1);
    server.verify().await;
}

#[tokio::test]
async fn test_depth_limit() {
    let server = MockServer::start().await;
    mount_small_site(&server).await;

    let mut config = test_config(&[format!("{}/", server.uri())]);
    config.crawler.max_depth = 1;
    let (coordinator, sink) = http_coordinator(config);
    let summary = coordinator.run().await;

    assert_eq!(summary.pages_completed, 3);
    assert!(summary.frontier.too_deep >= 1);
    assert!(sink.urls().iter().all(|url| !url.ends_with("/page3")));
}

#[tokio::test]
async fn test_max_pages_cap() {
    let server = MockServer::start().await;
    mount_robots(&server, "").await;

    let routes: Vec<String> = (0..30).map(|i| format!("/item/{}", i)).collect();
    let hrefs: Vec<&str> = routes.iter().map(String::as_str).collect();
    mount_page(&server, "/", html_page("Index", &hrefs)).await;
    for route in &routes {
        mount_page(&server, route, html_page(route, &hrefs)).await;
    }

    let mut config = test_config(&[format!("{}/", server.uri())]);
    config.crawler.max_pages = 5;
    config.crawler.concurrency = 10;
    let (coordinator, sink) = http_coordinator(config);
    let summary = coordinator.run().await;

    assert_eq!(summary.termination, TerminationReason::PageLimitReached);
    assert_eq!(summary.pages_completed, 5);
    assert_eq!(sink.len(), 5);

    let page_requests = server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.url.path() != "/robots.txt")
        .count();
    assert!(page_requests <= 5, "fetched {} pages", page_requests);
}

#[tokio::test]
async fn test_failing_host_terminates() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let seeds = vec![
        format!("{}/", server.uri()),
        format!("{}/a", server.uri()),
        format!("{}/b", server.uri()),
    ];
    let (coordinator, sink) = http_coordinator(test_config(&seeds));
    let summary = coordinator.run().await;

    assert_eq!(summary.termination, TerminationReason::FrontierExhausted);
    assert_eq!(summary.pages_completed, 0);
    assert_eq!(summary.pages_failed, 3);
    assert!(sink.is_empty());
}

#[tokio::test]
async fn test_non_html_body_yields_no_links() {
    let server = MockServer::start().await;
    mount_robots(&server, "").await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(""))
        .mount(&server)
        .await;

    let (coordinator, sink) = http_coordinator(test_config(&[format!("{}/", server.uri())]));
    let summary = coordinator.run().await;

    assert_eq!(summary.pages_completed, 1);
    assert!(sink.pages()[0].data.links.is_empty());
}

#[tokio::test]
async fn test_crawl_delay_spaces_requests() {
    let server = MockServer::start().await;
    mount_robots(&server, "User-agent: *\nCrawl-delay: 1\n").await;
    mount_page(&server, "/", html_page("Home", &["/a", "/b"])).await;
    mount_page(&server, "/a", html_page("A", &[])).await;
    mount_page(&server, "/b", html_page("B", &[])).await;

    let start = Instant::now();
    let (coordinator, _sink) = http_coordinator(test_config(&[format!("{}/", server.uri())]));
    let summary = coordinator.run().await;

    assert_eq!(summary.pages_completed, 3);
    // Three requests one second apart
    assert!(start.elapsed() >= Duration::from_millis(1900));
}

#[tokio::test]
async fn test_cancellation_stops_crawl() {
    let server = MockServer::start().await;
    mount_robots(&server, "").await;

    let routes: Vec<String> = (0..10).map(|i| format!("/slow/{}", i)).collect();
    let hrefs: Vec<&str> = routes.iter().map(String::as_str).collect();
    mount_page(&server, "/", html_page("Index", &hrefs)).await;
    for route in &routes {
        mount_page(&server, route, html_page(route, &[])).await;
    }

    let mut config = test_config(&[format!("{}/", server.uri())]);
    config.crawler.default_delay_ms = 10_000;
    let (coordinator, _sink) = http_coordinator(config);

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        trigger.cancel();
    });

    let start = Instant::now();
    let summary = coordinator.run_with_cancel(cancel).await;

    assert_eq!(summary.termination, TerminationReason::Cancelled);
    assert_eq!(summary.pages_completed, 1);
    assert!(summary.frontier_remaining > 0);
    assert!(start.elapsed() < Duration::from_secs(5));
}
