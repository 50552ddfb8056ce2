use crate::{mount_small_site, test_config};
use std::fs;
use tempfile::TempDir;
use tide_frontier::config::OutputFormat;
use tide_frontier::crawler::{run_crawl, TerminationReason};
use tide_frontier::storage::{open_storage, RunStatus, Storage};
use tokio_util::sync::CancellationToken;
use wiremock::MockServer;

#[tokio::test]
async fn test_json_output_writes_one_file_per_page() {
    let server = MockServer::start().await;
    mount_small_site(&server).await;
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("pages");

    let mut config = test_config(&[format!("{}/", server.uri())]);
    config.output.format = OutputFormat::Json;
    config.output.directory = out.to_string_lossy().into_owned();

    let summary = run_crawl(config, "hash", CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(summary.pages_completed, 4);

    let files: Vec<_> = fs::read_dir(&out)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|path| path.extension().map_or(false, |ext| ext == "json"))
        .collect();
    assert_eq!(files.len(), 4);

    let page1 = files
        .iter()
        .find(|path| path.to_string_lossy().ends_with("page1.json"))
        .expect("page1 file missing");
    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(page1).unwrap()).unwrap();
    assert_eq!(json["title"], "Page 1");
    assert_eq!(json["depth"], 1);
    assert!(json["url"].as_str().unwrap().ends_with("/page1"));
    assert!(json["crawlTime"].is_string());
    assert!(json["links"].is_array());
}

#[tokio::test]
async fn test_sqlite_output_records_run_and_pages() {
    let server = MockServer::start().await;
    mount_small_site(&server).await;
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("crawl.db");

    let mut config = test_config(&[format!("{}/", server.uri())]);
    config.output.format = OutputFormat::Sqlite;
    config.output.database_path = db.to_string_lossy().into_owned();

    let summary = run_crawl(config, "abc123", CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(summary.termination, TerminationReason::FrontierExhausted);

    let storage = open_storage(&db).unwrap();
    let run = storage.get_latest_run().unwrap().expect("run missing");
    assert_eq!(run.config_hash, "abc123");
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.termination, Some(TerminationReason::FrontierExhausted));
    assert_eq!(run.pages_completed, 4);
    assert_eq!(storage.count_pages(run.id).unwrap(), 4);
    assert!(storage.count_links(run.id).unwrap() >= 5);
}

#[tokio::test]
async fn test_markdown_summary_is_written() {
    let server = MockServer::start().await;
    mount_small_site(&server).await;
    let dir = TempDir::new().unwrap();
    let summary_path = dir.path().join("reports").join("summary.md");

    let mut config = test_config(&[format!("{}/", server.uri())]);
    config.output.summary_path = Some(summary_path.to_string_lossy().into_owned());

    run_crawl(config, "hash", CancellationToken::new())
        .await
        .unwrap();

    let markdown = fs::read_to_string(&summary_path).unwrap();
    assert!(markdown.contains("# Tide-Frontier Crawl Summary"));
    assert!(markdown.contains("frontier_exhausted"));
}

#[tokio::test]
async fn test_invalid_config_fails_before_crawling() {
    let server = MockServer::start().await;
    mount_small_site(&server).await;

    let mut config = test_config(&[format!("{}/", server.uri())]);
    config.crawler.max_pages = 0;

    let result = run_crawl(config, "hash", CancellationToken::new()).await;
    assert!(result.is_err());
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}
