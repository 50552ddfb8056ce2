//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::crawler::{CrawlSummary, TerminationReason};
use crate::output::CrawledPage;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{RunRecord, RunStatus};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const RUN_COLUMNS: &str = "id, started_at, finished_at, config_hash, status, termination,
     pages_completed, pages_failed, robots_denied, duration_ms";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens or creates the database at `path`
    pub fn new(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // Configure SQLite for better performance
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    let termination: Option<String> = row.get(5)?;
    let duration_ms: Option<i64> = row.get(9)?;

    Ok(RunRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        config_hash: row.get(3)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(4)?)
            .unwrap_or(RunStatus::Running),
        termination: termination
            .as_deref()
            .and_then(TerminationReason::from_db_string),
        pages_completed: row.get::<_, i64>(6)? as u64,
        pages_failed: row.get::<_, i64>(7)? as u64,
        robots_denied: row.get::<_, i64>(8)? as u64,
        duration_ms: duration_ms.map(|ms| ms as u64),
    })
}

impl Storage for SqliteStorage {
    // ===== Run Management =====

    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn finish_run(&mut self, run_id: i64, summary: &CrawlSummary) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, termination = ?3,
             pages_completed = ?4, pages_failed = ?5, robots_denied = ?6, duration_ms = ?7
             WHERE id = ?8",
            params![
                RunStatus::for_termination(summary.termination).to_db_string(),
                now,
                summary.termination.as_str(),
                summary.pages_completed as i64,
                summary.pages_failed as i64,
                summary.robots_denied as i64,
                summary.duration.as_millis() as i64,
                run_id
            ],
        )?;

        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        let sql = format!("SELECT {} FROM runs WHERE id = ?1", RUN_COLUMNS);
        self.conn
            .query_row(&sql, params![run_id], run_from_row)
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let sql = format!("SELECT {} FROM runs ORDER BY id DESC LIMIT 1", RUN_COLUMNS);
        Ok(self.conn.query_row(&sql, [], run_from_row).optional()?)
    }

    fn list_runs(&self) -> StorageResult<Vec<RunRecord>> {
        let sql = format!("SELECT {} FROM runs ORDER BY id DESC", RUN_COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;
        let runs = stmt
            .query_map([], run_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(runs)
    }

    // ===== Page Management =====

    fn insert_page(&mut self, run_id: i64, page: &CrawledPage) -> StorageResult<i64> {
        let tx = self.conn.transaction()?;

        tx.execute(
            "DELETE FROM pages WHERE run_id = ?1 AND url = ?2",
            params![run_id, page.url],
        )?;

        tx.execute(
            "INSERT INTO pages (run_id, url, host, depth, title, description, body_text, crawled_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                run_id,
                page.url,
                page.host,
                page.depth,
                page.data.title,
                page.data.description,
                page.data.text,
                page.crawl_time.to_rfc3339()
            ],
        )?;
        let page_id = tx.last_insert_rowid();

        {
            let mut stmt = tx.prepare(
                "INSERT INTO links (page_id, url, anchor_text, nofollow) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for link in &page.data.links {
                stmt.execute(params![page_id, link.url, link.anchor_text, link.no_follow])?;
            }
        }

        tx.commit()?;
        Ok(page_id)
    }

    fn count_pages(&self, run_id: i64) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM pages WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn page_urls(&self, run_id: i64) -> StorageResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT url FROM pages WHERE run_id = ?1 ORDER BY id")?;
        let urls = stmt
            .query_map(params![run_id], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(urls)
    }

    fn count_links(&self, run_id: i64) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM links JOIN pages ON links.page_id = pages.id
             WHERE pages.run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::{DiscoveredLink, ParsedPage};
    use crate::frontier::FrontierStats;
    use std::time::Duration;

    fn page(url: &str, links: usize) -> CrawledPage {
        CrawledPage {
            url: url.to_string(),
            host: "example.com".to_string(),
            depth: 1,
            crawl_time: Utc::now(),
            data: ParsedPage {
                title: Some("Title".to_string()),
                description: None,
                text: "body".to_string(),
                links: (0..links)
                    .map(|i| DiscoveredLink {
                        url: format!("https://example.com/{}", i),
                        anchor_text: format!("link {}", i),
                        no_follow: i % 2 == 1,
                    })
                    .collect(),
            },
        }
    }

    fn summary(termination: TerminationReason) -> CrawlSummary {
        CrawlSummary {
            started_at: Utc::now(),
            duration: Duration::from_millis(1500),
            termination,
            pages_completed: 4,
            pages_failed: 1,
            robots_denied: 2,
            frontier_remaining: 0,
            frontier: FrontierStats::default(),
            hosts_contacted: 1,
        }
    }

    #[test]
    fn test_create_and_get_run() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let run_id = storage.create_run("abc123").unwrap();

        let run = storage.get_run(run_id).unwrap();
        assert_eq!(run.config_hash, "abc123");
        assert_eq!(run.status, RunStatus::Running);
        assert!(run.finished_at.is_none());
        assert!(run.termination.is_none());
    }

    #[test]
    fn test_missing_run() {
        let storage = SqliteStorage::new_in_memory().unwrap();
        assert!(matches!(storage.get_run(42), Err(StorageError::RunNotFound(42))));
    }

    #[test]
    fn test_finish_run_records_outcome() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let run_id = storage.create_run("hash").unwrap();

        storage
            .finish_run(run_id, &summary(TerminationReason::PageLimitReached))
            .unwrap();

        let run = storage.get_run(run_id).unwrap();
        assert_eq!(run.status, RunStatus::Completed);
        assert_eq!(run.termination, Some(TerminationReason::PageLimitReached));
        assert_eq!(run.pages_completed, 4);
        assert_eq!(run.pages_failed, 1);
        assert_eq!(run.robots_denied, 2);
        assert_eq!(run.duration_ms, Some(1500));
        assert!(run.finished_at.is_some());
    }

    #[test]
    fn test_cancelled_run_is_interrupted() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let run_id = storage.create_run("hash").unwrap();
        storage
            .finish_run(run_id, &summary(TerminationReason::Cancelled))
            .unwrap();

        assert_eq!(
            storage.get_latest_run().unwrap().unwrap().status,
            RunStatus::Interrupted
        );
    }

    #[test]
    fn test_list_runs_newest_first() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let first = storage.create_run("one").unwrap();
        let second = storage.create_run("two").unwrap();

        let ids: Vec<i64> = storage.list_runs().unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![second, first]);
    }

    #[test]
    fn test_insert_page_with_links() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let run_id = storage.create_run("hash").unwrap();

        storage.insert_page(run_id, &page("https://example.com/a", 3)).unwrap();
        storage.insert_page(run_id, &page("https://example.com/b", 2)).unwrap();

        assert_eq!(storage.count_pages(run_id).unwrap(), 2);
        assert_eq!(storage.count_links(run_id).unwrap(), 5);
        assert_eq!(
            storage.page_urls(run_id).unwrap(),
            vec!["https://example.com/a", "https://example.com/b"]
        );
    }

    #[test]
    fn test_reinsert_replaces_page() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let run_id = storage.create_run("hash").unwrap();

        storage.insert_page(run_id, &page("https://example.com/a", 3)).unwrap();
        storage.insert_page(run_id, &page("https://example.com/a", 1)).unwrap();

        assert_eq!(storage.count_pages(run_id).unwrap(), 1);
        assert_eq!(storage.count_links(run_id).unwrap(), 1);
    }

    #[test]
    fn test_file_database_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("crawl.db");

        let run_id = {
            let mut storage = SqliteStorage::new(&path).unwrap();
            let run_id = storage.create_run("hash").unwrap();
            storage.insert_page(run_id, &page("https://example.com/", 0)).unwrap();
            run_id
        };

        let storage = SqliteStorage::new(&path).unwrap();
        assert_eq!(storage.count_pages(run_id).unwrap(), 1);
    }
}
