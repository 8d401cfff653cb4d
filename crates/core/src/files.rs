//! Fluent loader for container listings
//!
//! Built by [`Container::files`](crate::Container::files). Nothing is sent
//! until [`FilesLoader::get`] or [`FilesLoader::find`] is awaited.

use serde::{Deserialize, Serialize};

use crate::collection::Collection;
use crate::error::{Error, Result};
use crate::transport::{Method, Request, Response, Transport};
use crate::upload::DIRECTORY_CONTENT_TYPE;

/// A file or virtual directory inside a container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    /// Path relative to the container
    pub path: String,

    /// Size in bytes (0 for directories)
    pub size_bytes: u64,

    /// Human-readable size
    pub size_human: String,

    /// MD5 of the content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    /// Last modification time as reported by the service
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,

    /// Whether this is a directory marker or a listing prefix
    pub is_dir: bool,
}

impl FileInfo {
    /// Create a new FileInfo for a file
    pub fn file(path: impl Into<String>, size: u64) -> Self {
        Self {
            path: path.into(),
            size_bytes: size,
            size_human: humansize::format_size(size, humansize::BINARY),
            etag: None,
            content_type: None,
            last_modified: None,
            is_dir: false,
        }
    }

    /// Create a new FileInfo for a directory
    pub fn dir(path: impl Into<String>) -> Self {
        Self {
            is_dir: true,
            ..Self::file(path, 0)
        }
    }

    /// Parsed modification time
    ///
    /// Listings report a naive timestamp ("2024-01-31T08:15:00.123456"),
    /// object HEAD responses an HTTP date. Both are understood.
    pub fn modified_at(&self) -> Option<jiff::civil::DateTime> {
        let raw = self.last_modified.as_deref()?;
        raw.parse::<jiff::civil::DateTime>().ok().or_else(|| {
            jiff::fmt::rfc2822::parse(raw)
                .ok()
                .map(|zoned| zoned.datetime())
        })
    }

    fn from_head(path: &str, response: &Response) -> Self {
        let mut info = Self::file(path, response.header_u64("content-length").unwrap_or(0));
        info.etag = response.etag().map(str::to_string);
        info.content_type = response.header("content-type").map(str::to_string);
        info.last_modified = response.header("last-modified").map(str::to_string);
        info.is_dir = info.content_type.as_deref() == Some(DIRECTORY_CONTENT_TYPE);
        info
    }
}

/// Entry of a JSON container listing
#[derive(Debug, Deserialize)]
struct ListingEntry {
    name: Option<String>,
    subdir: Option<String>,
    #[serde(default)]
    bytes: u64,
    hash: Option<String>,
    content_type: Option<String>,
    last_modified: Option<String>,
}

impl From<ListingEntry> for FileInfo {
    fn from(entry: ListingEntry) -> Self {
        if let Some(subdir) = entry.subdir {
            return FileInfo::dir(subdir);
        }

        let mut info = FileInfo::file(entry.name.unwrap_or_default(), entry.bytes);
        info.is_dir = entry.content_type.as_deref() == Some(DIRECTORY_CONTENT_TYPE);
        info.etag = entry.hash;
        info.content_type = entry.content_type;
        info.last_modified = entry.last_modified;
        info
    }
}

/// Query builder for the files of one container
#[derive(Clone)]
pub struct FilesLoader<'a> {
    transport: &'a dyn Transport,
    container: &'a str,
    prefix: Option<String>,
    delimiter: Option<String>,
    limit: Option<usize>,
    marker: Option<String>,
}

impl<'a> FilesLoader<'a> {
    pub fn new(transport: &'a dyn Transport, container: &'a str) -> Self {
        Self {
            transport,
            container,
            prefix: None,
            delimiter: None,
            limit: None,
            marker: None,
        }
    }

    /// Only the direct children of `directory`
    pub fn from_directory(mut self, directory: &str) -> Self {
        let directory = directory.trim_matches('/');
        self.prefix = (!directory.is_empty()).then(|| format!("{directory}/"));
        self.delimiter = Some("/".to_string());
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = Some(delimiter.into());
        self
    }

    /// Maximum number of entries to return
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Start after this path (pagination marker)
    pub fn after(mut self, marker: impl Into<String>) -> Self {
        self.marker = Some(marker.into());
        self
    }

    fn request(&self) -> Request {
        let mut request = Request::new(Method::Get, self.container).query("format", "json");
        if let Some(prefix) = &self.prefix {
            request = request.query("prefix", prefix);
        }
        if let Some(delimiter) = &self.delimiter {
            request = request.query("delimiter", delimiter);
        }
        if let Some(limit) = self.limit {
            request = request.query("limit", limit.to_string());
        }
        if let Some(marker) = &self.marker {
            request = request.query("marker", marker);
        }
        request
    }

    /// Execute the query
    pub async fn get(self) -> Result<Collection<FileInfo>> {
        let response = self.transport.send(self.request()).await?;
        tracing::debug!(container = self.container, status = response.status, "List files");

        match response.status {
            204 => Ok(Collection::new()),
            _ if response.is_success() => {
                let entries: Vec<ListingEntry> = response.json()?;
                Ok(entries
                    .into_iter()
                    .map(FileInfo::from)
                    .collect::<Vec<_>>()
                    .into())
            }
            status => Err(Error::request_failed("list files", self.container, status)),
        }
    }

    /// Look up a single file by path; `None` when it does not exist
    pub async fn find(&self, path: &str) -> Result<Option<FileInfo>> {
        let path = path.trim_start_matches('/');
        let target = format!("{}/{}", self.container, path);
        let response = self
            .transport
            .send(Request::new(Method::Head, &target))
            .await?;

        match response.status {
            404 => Ok(None),
            _ if response.is_success() => Ok(Some(FileInfo::from_head(path, &response))),
            status => Err(Error::request_failed("find file", target, status)),
        }
    }

    /// Whether a file exists at `path`
    pub async fn exists(&self, path: &str) -> Result<bool> {
        Ok(self.find(path).await?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MemoryTransport;

    const LISTING: &str = r#"[
        {"name": "docs/readme.txt", "bytes": 2048, "hash": "abc", "content_type": "text/plain", "last_modified": "2024-01-31T08:15:00.123456"},
        {"name": "docs/drafts", "bytes": 0, "hash": "d41d8cd98f00b204e9800998ecf8427e", "content_type": "application/directory", "last_modified": "2024-01-30T10:00:00.000000"},
        {"subdir": "docs/old/"}
    ]"#;

    #[tokio::test]
    async fn test_get_builds_query() {
        let transport = MemoryTransport::new();
        transport.respond(Response::new(200).with_body(LISTING));

        let files = FilesLoader::new(&transport, "photos")
            .from_directory("/docs/")
            .limit(10)
            .after("docs/a")
            .get()
            .await
            .unwrap();

        let request = transport.last_request();
        assert_eq!(request.method, Method::Get);
        assert_eq!(request.path, "photos");
        assert_eq!(
            request.query,
            vec![
                ("format".to_string(), "json".to_string()),
                ("prefix".to_string(), "docs/".to_string()),
                ("delimiter".to_string(), "/".to_string()),
                ("limit".to_string(), "10".to_string()),
                ("marker".to_string(), "docs/a".to_string()),
            ]
        );

        assert_eq!(files.count(), 3);
        let readme = files.get(0).unwrap();
        assert_eq!(readme.path, "docs/readme.txt");
        assert_eq!(readme.size_bytes, 2048);
        assert_eq!(readme.size_human, "2 KiB");
        assert!(!readme.is_dir);
        assert!(files.get(1).unwrap().is_dir);
        assert_eq!(files.get(2).unwrap(), &FileInfo::dir("docs/old/"));
    }

    #[tokio::test]
    async fn test_get_empty_container() {
        let transport = MemoryTransport::new();
        transport.respond(Response::new(204));

        let files = FilesLoader::new(&transport, "photos").get().await.unwrap();
        assert!(files.is_empty());
    }

    #[tokio::test]
    async fn test_get_failure() {
        let transport = MemoryTransport::new();
        transport.respond(Response::new(500));

        let err = FilesLoader::new(&transport, "photos").get().await.unwrap_err();
        assert!(matches!(
            err,
            Error::RequestFailed {
                operation: "list files",
                status: 500,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_find() {
        let transport = MemoryTransport::new();
        transport.respond(
            Response::new(200)
                .with_header("Content-Length", "5")
                .with_header("ETag", "5d41402abc4b2a76b9719d911017c592")
                .with_header("Content-Type", "text/plain")
                .with_header("Last-Modified", "Wed, 31 Jan 2024 08:15:00 GMT"),
        );
        transport.respond(Response::new(404));

        let loader = FilesLoader::new(&transport, "photos");
        let info = loader.find("/a.txt").await.unwrap().unwrap();
        assert_eq!(transport.last_request().path, "photos/a.txt");
        assert_eq!(info.path, "a.txt");
        assert_eq!(info.size_bytes, 5);
        assert_eq!(info.etag.as_deref(), Some("5d41402abc4b2a76b9719d911017c592"));
        assert!(info.modified_at().is_some());

        assert!(!loader.exists("missing.txt").await.unwrap());
    }

    #[test]
    fn test_modified_at_listing_format() {
        let mut info = FileInfo::file("a.txt", 1);
        info.last_modified = Some("2024-01-31T08:15:00.123456".to_string());

        let modified = info.modified_at().unwrap();
        assert_eq!(modified.year(), 2024);
        assert_eq!(modified.month(), 1);
        assert_eq!(modified.day(), 31);
    }
}
