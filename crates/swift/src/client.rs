//! Swift transport implementation
//!
//! [`SwiftClient`] implements the [`Transport`] trait on top of `reqwest`.

use std::collections::BTreeMap;
use std::io;
use std::time::Duration;

use async_trait::async_trait;
use cs_core::{Account, BodyStream, Error, Method, Request, Resource, Response, Result, Transport};
use futures::SinkExt;
use futures::channel::mpsc;
use reqwest::header::HeaderMap;
use reqwest::{Client, RequestBuilder};
use tokio::io::AsyncReadExt;
use url::Url;

use crate::auth::{Session, authenticate};

/// Size of the chunks streamed uploads are read in
const STREAM_CHUNK_SIZE: usize = 64 * 1024;

/// Chunks buffered between the reader and the connection
const STREAM_CHANNEL_DEPTH: usize = 4;

const USER_AGENT: &str = concat!("cs/", env!("CARGO_PKG_VERSION"));

/// Header prefix carrying metadata of `resource`
pub fn meta_prefix(resource: Resource) -> &'static str {
    match resource {
        Resource::Account => "X-Account-Meta-",
        Resource::Container => "X-Container-Meta-",
        Resource::Object => "X-Object-Meta-",
    }
}

pub(crate) fn network_error(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Network(format!("Request timed out: {e}"))
    } else if e.is_builder() {
        Error::General(format!("Invalid request: {e}"))
    } else {
        Error::Network(format!("Request failed: {e}"))
    }
}

/// Authenticated client for one storage account
pub struct SwiftClient {
    http: Client,
    session: Session,
    storage_url: Url,
}

impl SwiftClient {
    /// Authenticate `account` and return a ready client
    ///
    /// Tokens are not refreshed behind the caller's back; once
    /// [`Session::is_expired`] reports true, connect again.
    pub async fn connect(account: &Account) -> Result<Self> {
        let http = build_http_client(account)?;
        let session = authenticate(&http, account).await?;
        tracing::debug!(account = %account.name, storage_url = session.storage_url(), "Connected");
        Self::with_session(http, session)
    }

    /// Use an existing session
    pub fn with_session(http: Client, session: Session) -> Result<Self> {
        let storage_url = Url::parse(session.storage_url())?;
        if storage_url.cannot_be_a_base() {
            return Err(Error::Auth(format!(
                "Unusable storage URL '{}'",
                session.storage_url()
            )));
        }
        Ok(Self {
            http,
            session,
            storage_url,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    fn url(&self, request: &Request) -> Url {
        let mut url = self.storage_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty();
            let path = request.path.trim_start_matches('/');
            if !path.is_empty() {
                segments.extend(path.split('/'));
            }
        }
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&request.query);
        }
        url
    }

    fn builder(&self, request: &Request) -> Result<RequestBuilder> {
        if self.session.is_expired() {
            return Err(Error::Auth("Session token expired, reconnect".into()));
        }

        let prefix = meta_prefix(request.resource());
        let mut builder = self
            .http
            .request(http_method(request.method), self.url(request))
            .header("X-Auth-Token", self.session.token());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        for (key, value) in &request.metadata {
            builder = builder.header(format!("{prefix}{key}"), value.as_str());
        }
        Ok(builder)
    }

    async fn execute(&self, request: &Request, builder: RequestBuilder) -> Result<Response> {
        let response = builder.send().await.map_err(network_error)?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(network_error)?;

        tracing::debug!(method = %request.method, path = %request.path, status, "Swift request");
        Ok(convert_response(
            request.resource(),
            status,
            &headers,
            body.to_vec(),
        ))
    }
}

#[async_trait]
impl Transport for SwiftClient {
    fn storage_url(&self) -> &str {
        self.session.storage_url()
    }

    async fn send(&self, request: Request) -> Result<Response> {
        let mut builder = self.builder(&request)?;
        if request.method == Method::Put || !request.body.is_empty() {
            builder = builder.body(request.body.clone());
        }
        self.execute(&request, builder).await
    }

    async fn send_stream(&self, request: Request, body: BodyStream<'_>) -> Result<Response> {
        let (mut tx, rx) = mpsc::channel::<io::Result<Vec<u8>>>(STREAM_CHANNEL_DEPTH);
        let builder = self
            .builder(&request)?
            .body(reqwest::Body::wrap_stream(rx));

        // Dropping the sender at end of input finishes the request body
        let pump = async move {
            let mut buf = vec![0u8; STREAM_CHUNK_SIZE];
            loop {
                match body.read(&mut buf).await {
                    Ok(0) => break,
                    Ok(n) => {
                        if tx.send(Ok(buf[..n].to_vec())).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        let _ = tx.send(Err(e)).await;
                        break;
                    }
                }
            }
        };

        let ((), outcome) = futures::join!(pump, self.execute(&request, builder));
        outcome
    }
}

fn build_http_client(account: &Account) -> Result<Client> {
    let timeout = account.timeout_config();
    Client::builder()
        .user_agent(USER_AGENT)
        .danger_accept_invalid_certs(account.insecure)
        .connect_timeout(Duration::from_millis(timeout.connect_ms))
        .read_timeout(Duration::from_millis(timeout.read_ms))
        .build()
        .map_err(|e| Error::Network(format!("Failed to create HTTP client: {e}")))
}

fn http_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Head => reqwest::Method::HEAD,
        Method::Put => reqwest::Method::PUT,
        Method::Post => reqwest::Method::POST,
        Method::Delete => reqwest::Method::DELETE,
    }
}

/// Split raw headers into plain headers and unprefixed metadata
fn convert_response(
    resource: Resource,
    status: u16,
    headers: &HeaderMap,
    body: Vec<u8>,
) -> Response {
    let prefix = meta_prefix(resource).to_ascii_lowercase();
    let mut plain = BTreeMap::new();
    let mut metadata = BTreeMap::new();

    for (name, value) in headers {
        let Ok(value) = value.to_str() else {
            continue;
        };
        match name.as_str().strip_prefix(prefix.as_str()) {
            Some(key) => metadata.insert(key.to_string(), value.to_string()),
            None => plain.insert(name.as_str().to_string(), value.to_string()),
        };
    }

    Response {
        status,
        headers: plain,
        metadata,
        body,
    }
}
