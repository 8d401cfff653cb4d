//! In-memory transport for unit tests

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::io::AsyncReadExt;

use crate::error::{Error, Result};
use crate::transport::{BodyStream, Request, Response, Transport};

pub(crate) const STORAGE_URL: &str = "https://storage.example.com/v1/SEL_1000";

/// Replays queued responses and records every request it receives
#[derive(Default)]
pub(crate) struct MemoryTransport {
    responses: Mutex<VecDeque<Result<Response>>>,
    requests: Mutex<Vec<Request>>,
    streamed: Mutex<Vec<Vec<u8>>>,
}

impl MemoryTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Queue a response for the next request
    pub(crate) fn respond(&self, response: Response) {
        self.responses.lock().unwrap().push_back(Ok(response));
    }

    /// Queue a transport error for the next request
    pub(crate) fn fail(&self, error: Error) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    pub(crate) fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub(crate) fn last_request(&self) -> Request {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no request was sent")
    }

    /// Bodies read from streaming uploads, in order
    pub(crate) fn streamed(&self) -> Vec<Vec<u8>> {
        self.streamed.lock().unwrap().clone()
    }

    fn next_response(&self, request: Request) -> Result<Response> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Error::General("no response queued".into())))
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    fn storage_url(&self) -> &str {
        STORAGE_URL
    }

    async fn send(&self, request: Request) -> Result<Response> {
        self.next_response(request)
    }

    async fn send_stream(&self, request: Request, body: BodyStream<'_>) -> Result<Response> {
        let mut buffer = Vec::new();
        body.read_to_end(&mut buffer).await?;
        self.streamed.lock().unwrap().push(buffer);
        self.next_response(request)
    }
}
