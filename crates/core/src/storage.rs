//! Storage entry point
//!
//! [`Storage`] lists the containers of an account and builds
//! [`RemoteContainer`] handles from the service's current view.

use std::sync::Arc;

use serde::Deserialize;
use url::Url;

use crate::collection::Collection;
use crate::container::{ContainerInfo, ContainerType, RemoteContainer, TYPE_META_KEY, fetch_info};
use crate::error::{Error, Result};
use crate::transport::{Method, Request, Transport};

/// Longest container name the service accepts, in bytes
pub const MAX_CONTAINER_NAME_LEN: usize = 255;

/// Check a container name before it is put on the wire
pub fn validate_container_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidPath("Container name cannot be empty".into()));
    }
    if name.contains('/') {
        return Err(Error::InvalidPath(format!(
            "Container name '{name}' cannot contain '/'"
        )));
    }
    if name.len() > MAX_CONTAINER_NAME_LEN {
        return Err(Error::InvalidPath(format!(
            "Container name is longer than {MAX_CONTAINER_NAME_LEN} bytes"
        )));
    }
    Ok(())
}

/// Entry of a JSON account listing
#[derive(Debug, Deserialize)]
struct AccountEntry {
    name: String,
    #[serde(default)]
    count: u64,
    #[serde(default)]
    bytes: u64,
    #[serde(rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    rx_bytes: u64,
    #[serde(default)]
    tx_bytes: u64,
}

impl From<AccountEntry> for ContainerInfo {
    fn from(entry: AccountEntry) -> Self {
        let kind = ContainerType::from_remote(&entry.name, entry.kind.as_deref());

        let mut info = ContainerInfo::new(entry.name, kind);
        info.files_count = entry.count;
        info.size_bytes = entry.bytes;
        info.uploaded_bytes = entry.rx_bytes;
        info.downloaded_bytes = entry.tx_bytes;
        info
    }
}

/// Containers of one storage account
pub struct Storage<T> {
    transport: Arc<T>,
    public_url: Url,
}

impl<T: Transport> Storage<T> {
    /// Use the transport's storage URL as the public address of containers
    pub fn new(transport: T) -> Result<Self> {
        Self::from_arc(Arc::new(transport))
    }

    pub fn from_arc(transport: Arc<T>) -> Result<Self> {
        let public_url = base_url(transport.storage_url())?;
        Ok(Self {
            transport,
            public_url,
        })
    }

    /// Serve public addresses from `url` (a CDN domain) instead
    pub fn with_public_url(mut self, url: &str) -> Result<Self> {
        self.public_url = base_url(url)?;
        Ok(self)
    }

    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    pub fn public_url(&self) -> &Url {
        &self.public_url
    }

    /// All containers of the account, keyed by name
    pub async fn containers(&self) -> Result<Collection<ContainerInfo>> {
        let request = Request::new(Method::Get, "").query("format", "json");
        let response = self.transport.send(request).await?;
        tracing::debug!(status = response.status, "List containers");

        match response.status {
            204 => Ok(Collection::new()),
            _ if response.is_success() => {
                let entries: Vec<AccountEntry> = response.json()?;
                Ok(entries
                    .into_iter()
                    .map(|entry| {
                        let info = ContainerInfo::from(entry);
                        (info.name.clone(), info)
                    })
                    .collect())
            }
            status => Err(Error::request_failed("list containers", "account", status)),
        }
    }

    /// Handle to an existing container
    pub async fn container(&self, name: &str) -> Result<RemoteContainer<T>> {
        validate_container_name(name)?;
        let info = fetch_info(self.transport.as_ref(), name).await?;
        Ok(self.wrap(info))
    }

    /// Create a container of the given type and return a handle to it
    ///
    /// Creating a container that already exists updates its type.
    pub async fn create_container(
        &self,
        name: &str,
        kind: ContainerType,
    ) -> Result<RemoteContainer<T>> {
        validate_container_name(name)?;

        let request = Request::new(Method::Put, name)
            .metadata([(TYPE_META_KEY.to_string(), kind.to_string())]);
        let response = self.transport.send(request).await?;
        tracing::debug!(container = name, status = response.status, "Create container");
        if !response.is_success() {
            return Err(Error::request_failed("create container", name, response.status));
        }
        tracing::info!(container = name, %kind, "Container created");

        let info = fetch_info(self.transport.as_ref(), name).await?;
        Ok(self.wrap(info))
    }

    fn wrap(&self, info: ContainerInfo) -> RemoteContainer<T> {
        RemoteContainer::new(Arc::clone(&self.transport), info, self.public_url.clone())
    }
}

fn base_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw)?;
    if url.cannot_be_a_base() {
        return Err(Error::Config(format!("'{raw}' cannot be used as a base URL")));
    }
    Ok(url)
}
