//! One JSON file per crawled page

use crate::output::{CrawledPage, OutputResult, PageSink};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use url::Url;

/// Writes each page as pretty-printed JSON into a directory
///
/// Files are named `<scheme>_<host>_<path with '/' replaced by '_'>.json`. Pages whose
/// URLs differ only in their query get a short hash of the query appended so
/// they do not overwrite each other.
#[derive(Debug, Clone)]
pub struct JsonDirectorySink {
    directory: PathBuf,
}

impl JsonDirectorySink {
    /// Creates the sink, creating `directory` if it does not exist
    pub fn new(directory: &Path) -> OutputResult<Self> {
        fs::create_dir_all(directory)?;
        Ok(Self {
            directory: directory.to_path_buf(),
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Path of the file a page with this URL is written to
    pub fn path_for(&self, url: &str) -> PathBuf {
        self.directory.join(file_name(url))
    }
}

impl PageSink for JsonDirectorySink {
    fn persist(&self, page: &CrawledPage) -> OutputResult<()> {
        let path = self.path_for(&page.url);
        let json = serde_json::to_string_pretty(page)?;
        fs::write(&path, json)?;

        debug!(url = %page.url, path = %path.display(), "Saved page");
        Ok(())
    }
}

fn file_name(url: &str) -> String {
    let Ok(parsed) = Url::parse(url) else {
        return format!("{}.json", sanitize(url));
    };

    let host = match (parsed.host_str(), parsed.port()) {
        (Some(host), Some(port)) => format!("{}_{}_{}", parsed.scheme(), host, port),
        (Some(host), None) => format!("{}_{}", parsed.scheme(), host),
        (None, _) => parsed.scheme().to_string(),
    };

    let path = parsed.path().replace('/', "_");
    let path = path.strip_prefix('_').unwrap_or(&path);

    match parsed.query() {
        Some(query) => {
            let digest = hex::encode(Sha256::digest(query.as_bytes()));
            format!("{}_{}_{}.json", host, sanitize(path), &digest[..8])
        }
        None => format!("{}_{}.json", host, sanitize(path)),
    }
}

/// Replaces characters that are not safe in file names
fn sanitize(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c => c,
        })
        .collect()
}
