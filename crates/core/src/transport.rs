//! Transport trait definition
//!
//! The core never talks HTTP itself. Every remote call goes through a
//! [`Transport`], which is implemented by the Swift adapter and by in-memory
//! doubles in tests.
//!
//! Metadata travels unprefixed in both directions: adding and stripping the
//! `X-{Account,Container,Object}-Meta-` header prefixes is the transport's job.

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use tokio::io::AsyncRead;

use crate::error::Result;

/// Borrowed request body for streaming uploads
pub type BodyStream<'a> = &'a mut (dyn AsyncRead + Send + Unpin);

/// HTTP method of a transport request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Head,
    Put,
    Post,
    Delete,
}

impl Method {
    pub const fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Put => "PUT",
            Method::Post => "POST",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a request path addresses, decides the metadata header prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    /// Empty path: the storage account
    Account,
    /// `container`
    Container,
    /// `container/object/path`
    Object,
}

/// A request to the storage service
///
/// `path` is relative to the storage root: empty for the account,
/// `container` or `container/object/path`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: BTreeMap<String, String>,
    pub metadata: BTreeMap<String, String>,
    pub body: Vec<u8>,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: BTreeMap::new(),
            metadata: BTreeMap::new(),
            body: Vec::new(),
        }
    }

    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn headers(mut self, headers: impl IntoIterator<Item = (String, String)>) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Attach unprefixed metadata
    pub fn metadata(mut self, metadata: impl IntoIterator<Item = (String, String)>) -> Self {
        self.metadata.extend(metadata);
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// The kind of resource the path points at
    pub fn resource(&self) -> Resource {
        let path = self.path.trim_matches('/');
        if path.is_empty() {
            Resource::Account
        } else if path.contains('/') {
            Resource::Object
        } else {
            Resource::Container
        }
    }
}

/// A response from the storage service
///
/// Header names are lowercase. Metadata keys have the transport prefix removed
/// and are lowercase as well.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub metadata: BTreeMap<String, String>,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            ..Default::default()
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_metadata(mut self, key: &str, value: impl Into<String>) -> Self {
        self.metadata.insert(key.to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Whether the status is 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Header value, looked up case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Numeric header value; missing or malformed values read as `None`
    pub fn header_u64(&self, name: &str) -> Option<u64> {
        self.header(name).and_then(|v| v.trim().parse().ok())
    }

    /// Content identity token, without surrounding quotes
    pub fn etag(&self) -> Option<&str> {
        self.header("etag")
            .map(|v| v.trim().trim_matches('"'))
            .filter(|v| !v.is_empty())
    }

    /// Decode the body as JSON
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// Capability for issuing requests against the storage service
///
/// Implementations report a non-success status through [`Response::status`];
/// `Err` is reserved for requests that did not complete (connection failures,
/// timeouts, authentication).
#[async_trait]
pub trait Transport: Send + Sync {
    /// Root URL of the storage account
    fn storage_url(&self) -> &str;

    /// Send a request with an in-memory body
    async fn send(&self, request: Request) -> Result<Response>;

    /// Send a request whose body is read from `body` until end of stream
    ///
    /// `request.body` is ignored. The reader is borrowed for the duration of
    /// the call and is neither closed nor dropped.
    async fn send_stream(&self, request: Request, body: BodyStream<'_>) -> Result<Response>;
}
