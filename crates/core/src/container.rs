//! Container contract and its transport-backed implementation
//!
//! A container is a named namespace holding files and virtual directories.
//! [`RemoteContainer`] keeps a snapshot of the container's attributes and
//! issues every operation through an injected [`Transport`].

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};
use crate::files::FilesLoader;
use crate::transport::{BodyStream, Method, Request, Response, Transport};
use crate::upload::{DIRECTORY_CONTENT_TYPE, HashingReader, UploadParams, UploadVerifier};

/// Metadata key holding the container type
pub const TYPE_META_KEY: &str = "Type";

/// Visibility of a container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerType {
    Public,
    Private,
    Gallery,
}

impl ContainerType {
    pub const ALL: [ContainerType; 3] = [
        ContainerType::Public,
        ContainerType::Private,
        ContainerType::Gallery,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            ContainerType::Public => "public",
            ContainerType::Private => "private",
            ContainerType::Gallery => "gallery",
        }
    }
}

impl fmt::Display for ContainerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for ContainerType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ContainerType::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::InvalidType(s.to_string()))
    }
}

impl ContainerType {
    /// Type reported by the service for `container`
    ///
    /// Missing or unknown values read as private. The value comes from the
    /// service, so it is never treated as a caller error.
    pub(crate) fn from_remote(container: &str, value: Option<&str>) -> Self {
        match value.map(str::parse::<ContainerType>) {
            Some(Ok(kind)) => kind,
            Some(Err(_)) => {
                tracing::warn!(container, kind = ?value, "Unknown container type, assuming private");
                ContainerType::Private
            }
            None => ContainerType::Private,
        }
    }
}

/// Snapshot of a container's remote attributes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerInfo {
    pub name: String,

    #[serde(rename = "type")]
    pub kind: ContainerType,

    pub size_bytes: u64,

    pub files_count: u64,

    /// Total bytes received by the container
    pub uploaded_bytes: u64,

    /// Total bytes served by the container
    pub downloaded_bytes: u64,

    /// Container metadata without the type entry
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

impl ContainerInfo {
    /// A freshly created, empty container
    pub fn new(name: impl Into<String>, kind: ContainerType) -> Self {
        Self {
            name: name.into(),
            kind,
            size_bytes: 0,
            files_count: 0,
            uploaded_bytes: 0,
            downloaded_bytes: 0,
            metadata: BTreeMap::new(),
        }
    }

    /// Build from the headers of a container HEAD response
    ///
    /// A container without a type entry, or with one this client does not
    /// know, is reported as private.
    pub fn from_head(name: impl Into<String>, response: &Response) -> Self {
        let name = name.into();
        let mut metadata = response.metadata.clone();
        let kind = ContainerType::from_remote(&name, take_meta(&mut metadata, TYPE_META_KEY).as_deref());

        Self {
            name,
            kind,
            size_bytes: response.header_u64("x-container-bytes-used").unwrap_or(0),
            files_count: response.header_u64("x-container-object-count").unwrap_or(0),
            uploaded_bytes: response.header_u64("x-received-bytes").unwrap_or(0),
            downloaded_bytes: response.header_u64("x-transfered-bytes").unwrap_or(0),
            metadata,
        }
    }
}

fn take_meta(metadata: &mut BTreeMap<String, String>, key: &str) -> Option<String> {
    let found = metadata
        .keys()
        .find(|k| k.eq_ignore_ascii_case(key))
        .cloned()?;
    metadata.remove(&found)
}

/// Operations on a storage container
///
/// Accessors read the local snapshot and never touch the network.
#[async_trait]
pub trait Container: Send + Sync {
    /// Container name
    fn name(&self) -> &str;

    /// Public address of `path` inside the container
    fn url(&self, path: &str) -> String;

    /// Container visibility
    fn container_type(&self) -> ContainerType;

    /// Size in bytes
    fn size(&self) -> u64;

    /// Number of stored files
    fn files_count(&self) -> u64;

    /// Total uploaded (received) bytes
    fn uploaded_bytes(&self) -> u64;

    /// Total downloaded (transmitted) bytes
    fn downloaded_bytes(&self) -> u64;

    /// Container metadata, without prefixes
    fn metadata(&self) -> &BTreeMap<String, String>;

    /// Change the container visibility and return the new value
    async fn set_type(&mut self, kind: ContainerType) -> Result<ContainerType>;

    /// Replace the container metadata with `meta`
    async fn set_meta(&mut self, meta: BTreeMap<String, String>) -> Result<()>;

    /// Query builder for the container's files
    fn files(&self) -> FilesLoader<'_>;

    /// Create a virtual directory and return its path
    async fn create_dir(&self, name: &str) -> Result<String>;

    /// Delete a virtual directory; a missing directory is not an error
    async fn delete_dir(&self, name: &str) -> Result<()>;

    /// Upload in-memory content and return its ETag
    ///
    /// With `verify_checksum` the MD5 of `contents` is computed up front and
    /// must equal the returned ETag.
    async fn upload_from_bytes(
        &self,
        path: &str,
        contents: &[u8],
        params: UploadParams,
        verify_checksum: bool,
    ) -> Result<String>;

    /// Upload text content and return its ETag
    async fn upload_from_string(
        &self,
        path: &str,
        contents: &str,
        params: UploadParams,
        verify_checksum: bool,
    ) -> Result<String> {
        self.upload_from_bytes(path, contents.as_bytes(), params, verify_checksum)
            .await
    }

    /// Upload content read from `stream` and return its ETag
    ///
    /// The stream is not hashed unless [`UploadParams::hash_stream`] is set;
    /// an [`UploadParams::etag`] is only checked by the service.
    async fn upload_from_stream(
        &self,
        path: &str,
        stream: BodyStream<'_>,
        params: UploadParams,
    ) -> Result<String>;

    /// Delete the container; it must be empty
    async fn delete(&mut self) -> Result<()>;
}

/// Container backed by a [`Transport`]
pub struct RemoteContainer<T> {
    transport: Arc<T>,
    info: ContainerInfo,
    public_url: Url,
    deleted: bool,
}

impl<T: Transport> RemoteContainer<T> {
    /// Wrap a snapshot; `public_url` must be usable as a base URL
    pub fn new(transport: Arc<T>, info: ContainerInfo, public_url: Url) -> Self {
        Self {
            transport,
            info,
            public_url,
            deleted: false,
        }
    }

    /// The attribute snapshot
    pub fn info(&self) -> &ContainerInfo {
        &self.info
    }

    /// Whether [`Container::delete`] succeeded on this instance
    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// Reload the attribute snapshot from the service
    pub async fn refresh(&mut self) -> Result<()> {
        self.ensure_live()?;
        self.info = fetch_info(self.transport.as_ref(), &self.info.name).await?;
        Ok(())
    }

    fn ensure_live(&self) -> Result<()> {
        if self.deleted {
            return Err(Error::ContainerDeleted(self.info.name.clone()));
        }
        Ok(())
    }

    fn object_path(&self, path: &str) -> String {
        format!("{}/{}", self.info.name, path.trim_start_matches('/'))
    }

    async fn send(&self, request: Request) -> Result<Response> {
        let method = request.method;
        let path = request.path.clone();
        let response = self.transport.send(request).await?;
        tracing::debug!(%method, %path, status = response.status, "Container request");
        Ok(response)
    }
}

/// HEAD a container and build its snapshot
pub(crate) async fn fetch_info<T: Transport + ?Sized>(
    transport: &T,
    name: &str,
) -> Result<ContainerInfo> {
    let response = transport.send(Request::new(Method::Head, name)).await?;
    match response.status {
        404 => Err(Error::NotFound(format!("Container not found: {name}"))),
        _ if response.is_success() => Ok(ContainerInfo::from_head(name, &response)),
        status => Err(Error::request_failed("get container", name, status)),
    }
}

#[async_trait]
impl<T: Transport> Container for RemoteContainer<T> {
    fn name(&self) -> &str {
        &self.info.name
    }

    fn url(&self, path: &str) -> String {
        let mut url = self.public_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(&self.info.name);
            let path = path.trim_start_matches('/');
            if !path.is_empty() {
                segments.extend(path.split('/'));
            }
        }
        url.to_string()
    }

    fn container_type(&self) -> ContainerType {
        self.info.kind
    }

    fn size(&self) -> u64 {
        self.info.size_bytes
    }

    fn files_count(&self) -> u64 {
        self.info.files_count
    }

    fn uploaded_bytes(&self) -> u64 {
        self.info.uploaded_bytes
    }

    fn downloaded_bytes(&self) -> u64 {
        self.info.downloaded_bytes
    }

    fn metadata(&self) -> &BTreeMap<String, String> {
        &self.info.metadata
    }

    async fn set_type(&mut self, kind: ContainerType) -> Result<ContainerType> {
        self.ensure_live()?;

        let request = Request::new(Method::Post, &self.info.name)
            .metadata([(TYPE_META_KEY.to_string(), kind.to_string())]);
        let response = self.send(request).await?;
        if !response.is_success() {
            return Err(Error::request_failed(
                "set type",
                &self.info.name,
                response.status,
            ));
        }

        tracing::info!(container = %self.info.name, from = %self.info.kind, to = %kind, "Container type changed");
        self.info.kind = kind;
        Ok(kind)
    }

    async fn set_meta(&mut self, mut meta: BTreeMap<String, String>) -> Result<()> {
        self.ensure_live()?;

        // Visibility only changes through set_type
        if take_meta(&mut meta, TYPE_META_KEY).is_some() {
            tracing::warn!(container = %self.info.name, "Ignoring type entry in metadata update");
        }

        // An empty value removes a key on the service side
        let removed = self
            .info
            .metadata
            .keys()
            .filter(|old| !meta.keys().any(|new| new.eq_ignore_ascii_case(old)))
            .map(|old| (old.clone(), String::new()));
        let request = Request::new(Method::Post, &self.info.name)
            .metadata(removed.collect::<Vec<_>>())
            .metadata(meta.clone());

        let response = self.send(request).await?;
        if !response.is_success() {
            return Err(Error::request_failed(
                "set metadata",
                &self.info.name,
                response.status,
            ));
        }

        self.info.metadata = meta;
        Ok(())
    }

    fn files(&self) -> FilesLoader<'_> {
        FilesLoader::new(self.transport.as_ref(), &self.info.name)
    }

    async fn create_dir(&self, name: &str) -> Result<String> {
        self.ensure_live()?;

        let dir = name.trim_matches('/');
        if dir.is_empty() {
            return Err(Error::InvalidPath("Directory name cannot be empty".into()));
        }

        let target = self.object_path(dir);
        let request = Request::new(Method::Put, &target).header("Content-Type", DIRECTORY_CONTENT_TYPE);
        let response = self.send(request).await?;
        if !response.is_success() {
            return Err(Error::request_failed(
                "create directory",
                target,
                response.status,
            ));
        }

        Ok(dir.to_string())
    }

    async fn delete_dir(&self, name: &str) -> Result<()> {
        self.ensure_live()?;

        let target = self.object_path(name.trim_matches('/'));
        let response = self.send(Request::new(Method::Delete, &target)).await?;
        match response.status {
            404 => {
                tracing::warn!(%target, "Directory already absent");
                Ok(())
            }
            _ if response.is_success() => Ok(()),
            status => Err(Error::request_failed("delete directory", target, status)),
        }
    }

    async fn upload_from_bytes(
        &self,
        path: &str,
        contents: &[u8],
        params: UploadParams,
        verify_checksum: bool,
    ) -> Result<String> {
        self.ensure_live()?;

        let target = self.object_path(path);
        let verifier = UploadVerifier::for_contents(&target, contents, verify_checksum);
        let request = params
            .apply(Request::new(Method::Put, &target), verifier.expected())
            .body(contents);

        let outcome = self.send(request).await;
        let etag = verifier.finish(outcome)?;
        tracing::info!(%target, bytes = contents.len(), %etag, "Uploaded");
        Ok(etag)
    }

    async fn upload_from_stream(
        &self,
        path: &str,
        stream: BodyStream<'_>,
        params: UploadParams,
    ) -> Result<String> {
        self.ensure_live()?;

        let target = self.object_path(path);
        let request = params.apply(Request::new(Method::Put, &target), None);

        let etag = if params.hash_stream {
            let mut reader = HashingReader::new(stream);
            let outcome = self.transport.send_stream(request, &mut reader).await;
            let bytes = reader.bytes_read();
            let etag = UploadVerifier::expecting(&target, reader.finish()).finish(outcome)?;
            tracing::info!(%target, bytes, %etag, "Uploaded stream");
            etag
        } else {
            let outcome = self.transport.send_stream(request, stream).await;
            let etag = UploadVerifier::unverified(&target).finish(outcome)?;
            tracing::info!(%target, %etag, "Uploaded stream");
            etag
        };
        Ok(etag)
    }

    async fn delete(&mut self) -> Result<()> {
        self.ensure_live()?;

        let response = self
            .send(Request::new(Method::Delete, &self.info.name))
            .await?;
        if !response.is_success() {
            if response.status == 409 {
                tracing::warn!(container = %self.info.name, "Container is not empty");
            }
            return Err(Error::request_failed(
                "delete container",
                &self.info.name,
                response.status,
            ));
        }

        tracing::info!(container = %self.info.name, "Container deleted");
        self.deleted = true;
        Ok(())
    }
}
