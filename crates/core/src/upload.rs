//! Upload parameters and content verification
//!
//! The service answers a successful upload with the MD5 digest of the stored
//! bytes as its ETag. [`UploadVerifier`] turns the outcome of an upload
//! request into either that token or an [`Error::UploadFailed`] that tells a
//! transport failure apart from corrupted content.

use std::collections::BTreeMap;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use md5::{Digest, Md5};
use tokio::io::{AsyncRead, ReadBuf};

use crate::error::{Error, Result};
use crate::transport::{BodyStream, Request, Response};

/// Content type of virtual directory markers
pub const DIRECTORY_CONTENT_TYPE: &str = "application/directory";

/// Optional parameters of an upload
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadParams {
    /// Explicit content type
    pub content_type: Option<String>,

    /// Content-Disposition header value
    pub content_disposition: Option<String>,

    /// Remove the object this many seconds after upload
    pub delete_after: Option<u64>,

    /// Remove the object at this moment
    pub delete_at: Option<jiff::Timestamp>,

    /// Expected MD5 of the content, verified by the service
    pub etag: Option<String>,

    /// Object metadata, without prefix
    pub metadata: BTreeMap<String, String>,

    /// Additional raw request headers
    pub headers: BTreeMap<String, String>,

    /// Hash streamed content while it is sent and compare with the returned ETag
    pub hash_stream: bool,
}

impl UploadParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn content_disposition(mut self, value: impl Into<String>) -> Self {
        self.content_disposition = Some(value.into());
        self
    }

    pub fn delete_after(mut self, seconds: u64) -> Self {
        self.delete_after = Some(seconds);
        self
    }

    pub fn delete_at(mut self, at: jiff::Timestamp) -> Self {
        self.delete_at = Some(at);
        self
    }

    pub fn etag(mut self, etag: impl Into<String>) -> Self {
        self.etag = Some(etag.into());
        self
    }

    pub fn meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn hash_stream(mut self, enabled: bool) -> Self {
        self.hash_stream = enabled;
        self
    }

    /// Attach these parameters to an upload request
    ///
    /// `etag` overrides [`UploadParams::etag`] when present.
    pub fn apply(&self, request: Request, etag: Option<&str>) -> Request {
        let mut request = request
            .headers(self.headers.clone())
            .metadata(self.metadata.clone());

        if let Some(content_type) = &self.content_type {
            request = request.header("Content-Type", content_type);
        }
        if let Some(disposition) = &self.content_disposition {
            request = request.header("Content-Disposition", disposition);
        }
        if let Some(seconds) = self.delete_after {
            request = request.header("X-Delete-After", seconds.to_string());
        }
        if let Some(at) = self.delete_at {
            request = request.header("X-Delete-At", at.as_second().to_string());
        }
        if let Some(etag) = etag.or(self.etag.as_deref()) {
            request = request.header("ETag", etag);
        }
        request
    }
}

/// Lowercase hex MD5 digest of `data`
pub fn md5_hex(data: &[u8]) -> String {
    hex::encode(Md5::digest(data))
}

/// Reader adapter that hashes every byte passing through it
pub struct HashingReader<'a> {
    inner: BodyStream<'a>,
    hasher: Md5,
    bytes: u64,
}

impl<'a> HashingReader<'a> {
    pub fn new(inner: BodyStream<'a>) -> Self {
        Self {
            inner,
            hasher: Md5::new(),
            bytes: 0,
        }
    }

    /// Number of bytes read so far
    pub fn bytes_read(&self) -> u64 {
        self.bytes
    }

    /// Hex digest of everything read so far
    pub fn finish(self) -> String {
        hex::encode(self.hasher.finalize())
    }
}

impl AsyncRead for HashingReader<'_> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let before = buf.filled().len();
        let poll = Pin::new(&mut *this.inner).poll_read(cx, buf);
        if let Poll::Ready(Ok(())) = &poll {
            let fresh = &buf.filled()[before..];
            this.hasher.update(fresh);
            this.bytes += fresh.len() as u64;
        }
        poll
    }
}

/// Decides the outcome of an upload request
#[derive(Debug, Clone)]
pub struct UploadVerifier {
    path: String,
    expected: Option<String>,
}

impl UploadVerifier {
    /// Verifier for in-memory contents; hashes them when `verify` is set
    pub fn for_contents(path: impl Into<String>, contents: &[u8], verify: bool) -> Self {
        Self {
            path: path.into(),
            expected: verify.then(|| md5_hex(contents)),
        }
    }

    /// Verifier comparing against a digest computed elsewhere
    pub fn expecting(path: impl Into<String>, expected: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            expected: Some(expected.into()),
        }
    }

    /// Verifier that accepts whatever token the service returns
    pub fn unverified(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            expected: None,
        }
    }

    /// Locally computed digest, if any
    pub fn expected(&self) -> Option<&str> {
        self.expected.as_deref()
    }

    /// Turn the transport outcome into the verified ETag
    pub fn finish(self, outcome: Result<Response>) -> Result<String> {
        let response = outcome.map_err(|e| match e {
            Error::UploadFailed { .. } => e,
            other => Error::upload_transport(&self.path, None, other.to_string()),
        })?;

        if !response.is_success() {
            return Err(Error::upload_transport(
                &self.path,
                Some(response.status),
                format!("HTTP {}", response.status),
            ));
        }

        let etag = response.etag().ok_or_else(|| {
            Error::upload_transport(
                &self.path,
                Some(response.status),
                "response carried no ETag",
            )
        })?;

        match &self.expected {
            Some(expected) if !expected.eq_ignore_ascii_case(etag) => {
                tracing::warn!(path = %self.path, %expected, actual = %etag, "Checksum mismatch");
                Err(Error::checksum_mismatch(&self.path, expected, etag))
            }
            Some(_) => {
                tracing::debug!(path = %self.path, %etag, "Upload verified");
                Ok(etag.to_string())
            }
            None => Ok(etag.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UploadFailure;
    use crate::transport::Method;
    use tokio::io::AsyncReadExt;

    const HELLO_MD5: &str = "5d41402abc4b2a76b9719d911017c592";

    #[test]
    fn test_md5_hex() {
        assert_eq!(md5_hex(b"hello"), HELLO_MD5);
        assert_eq!(md5_hex(b""), "d41d8cd98f00b204e9800998ecf8427e");
    }

    #[test]
    fn test_matching_etag_is_returned() {
        let verifier = UploadVerifier::for_contents("a.txt", b"hello", true);
        assert_eq!(verifier.expected(), Some(HELLO_MD5));

        let response = Response::new(201).with_header("ETag", format!("\"{HELLO_MD5}\""));
        assert_eq!(verifier.finish(Ok(response)).unwrap(), HELLO_MD5);
    }

    #[test]
    fn test_etag_comparison_ignores_case() {
        let verifier = UploadVerifier::for_contents("a.txt", b"hello", true);
        let response = Response::new(201).with_header("ETag", HELLO_MD5.to_uppercase());
        assert!(verifier.finish(Ok(response)).is_ok());
    }

    #[test]
    fn test_mismatching_etag_is_checksum_failure() {
        let verifier = UploadVerifier::for_contents("a.txt", b"hello", true);
        let response = Response::new(201).with_header("ETag", "0000");

        match verifier.finish(Ok(response)).unwrap_err() {
            Error::UploadFailed {
                path,
                reason: UploadFailure::ChecksumMismatch { expected, actual },
            } => {
                assert_eq!(path, "a.txt");
                assert_eq!(expected, HELLO_MD5);
                assert_eq!(actual, "0000");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unverified_accepts_any_etag() {
        let verifier = UploadVerifier::for_contents("a.txt", b"hello", false);
        assert!(verifier.expected().is_none());

        let response = Response::new(201).with_header("ETag", "0000");
        assert_eq!(verifier.finish(Ok(response)).unwrap(), "0000");
    }

    #[test]
    fn test_error_status_is_transport_failure() {
        for verify in [true, false] {
            let verifier = UploadVerifier::for_contents("a.txt", b"hello", verify);
            let err = verifier.finish(Ok(Response::new(503))).unwrap_err();
            assert!(matches!(
                err,
                Error::UploadFailed {
                    reason: UploadFailure::Transport {
                        status: Some(503),
                        ..
                    },
                    ..
                }
            ));
        }
    }

    #[test]
    fn test_network_error_is_transport_failure() {
        let verifier = UploadVerifier::unverified("a.txt");
        let err = verifier
            .finish(Err(Error::Network("connection reset".into())))
            .unwrap_err();
        assert!(err.is_retryable());
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn test_missing_etag_is_transport_failure() {
        let verifier = UploadVerifier::for_contents("a.txt", b"hello", true);
        let err = verifier.finish(Ok(Response::new(201))).unwrap_err();
        assert!(!err.is_checksum_mismatch());
        assert!(err.to_string().contains("no ETag"));
    }

    #[test]
    fn test_params_apply() {
        let params = UploadParams::new()
            .content_type("text/plain")
            .delete_after(60)
            .meta("Author", "me")
            .header("X-Custom", "1")
            .etag("caller");

        let request = params.apply(Request::new(Method::Put, "c/a.txt"), None);
        assert_eq!(request.headers.get("Content-Type").unwrap(), "text/plain");
        assert_eq!(request.headers.get("X-Delete-After").unwrap(), "60");
        assert_eq!(request.headers.get("X-Custom").unwrap(), "1");
        assert_eq!(request.headers.get("ETag").unwrap(), "caller");
        assert_eq!(request.metadata.get("Author").unwrap(), "me");

        let request = params.apply(Request::new(Method::Put, "c/a.txt"), Some(HELLO_MD5));
        assert_eq!(request.headers.get("ETag").unwrap(), HELLO_MD5);
    }

    #[tokio::test]
    async fn test_hashing_reader() {
        let mut source: &[u8] = b"hello";
        let mut reader = HashingReader::new(&mut source);

        let mut sink = Vec::new();
        reader.read_to_end(&mut sink).await.unwrap();

        assert_eq!(sink, b"hello");
        assert_eq!(reader.bytes_read(), 5);
        assert_eq!(reader.finish(), HELLO_MD5);
    }
}
