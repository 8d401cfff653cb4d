//! Error types for cs-core
//!
//! Provides a unified error type that can be converted to appropriate exit codes.
//! Failed remote operations are split into two families: administrative
//! requests ([`Error::RequestFailed`]) and uploads ([`Error::UploadFailed`]).
//! Misuse of the API ([`Error::InvalidType`], [`Error::ContainerDeleted`]) is
//! reported separately and never folded into either family.

use thiserror::Error;

/// Result type alias for cs-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for cs-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid path format
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Account not found
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Authentication error
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Network error (retryable)
    #[error("Network error: {0}")]
    Network(String),

    /// A remote administrative request answered with a non-success status
    #[error("{operation} failed for '{target}': HTTP {status}")]
    RequestFailed {
        operation: &'static str,
        target: String,
        status: u16,
    },

    /// An upload did not complete with verified content
    #[error("Upload failed for '{path}': {reason}")]
    UploadFailed { path: String, reason: UploadFailure },

    /// Container type outside of public, private and gallery
    #[error("Invalid container type '{0}': expected public, private or gallery")]
    InvalidType(String),

    /// Operation attempted on a container that was already deleted
    #[error("Container '{0}' has been deleted")]
    ContainerDeleted(String),

    /// General error
    #[error("{0}")]
    General(String),
}

/// Why an upload failed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadFailure {
    /// The request never completed or was answered with a non-success status
    #[error("{message}")]
    Transport {
        status: Option<u16>,
        message: String,
    },

    /// The bytes arrived but the returned ETag does not match the local digest
    #[error("checksum mismatch (expected {expected}, got {actual})")]
    ChecksumMismatch { expected: String, actual: String },
}

impl Error {
    /// Build a [`Error::RequestFailed`] for the given operation and target
    pub fn request_failed(operation: &'static str, target: impl Into<String>, status: u16) -> Self {
        Error::RequestFailed {
            operation,
            target: target.into(),
            status,
        }
    }

    /// Build an upload transport failure
    pub fn upload_transport(
        path: impl Into<String>,
        status: Option<u16>,
        message: impl Into<String>,
    ) -> Self {
        Error::UploadFailed {
            path: path.into(),
            reason: UploadFailure::Transport {
                status,
                message: message.into(),
            },
        }
    }

    /// Build an upload checksum mismatch
    pub fn checksum_mismatch(
        path: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Error::UploadFailed {
            path: path.into(),
            reason: UploadFailure::ChecksumMismatch {
                expected: expected.into(),
                actual: actual.into(),
            },
        }
    }

    /// Whether this error is a programming error on the caller's side
    pub const fn is_contract_violation(&self) -> bool {
        matches!(self, Error::InvalidType(_) | Error::ContainerDeleted(_))
    }

    /// Whether repeating the same operation may succeed
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Network(_)
                | Error::UploadFailed {
                    reason: UploadFailure::Transport { .. },
                    ..
                }
        )
    }

    /// Whether this is an upload whose content failed verification
    pub const fn is_checksum_mismatch(&self) -> bool {
        matches!(
            self,
            Error::UploadFailed {
                reason: UploadFailure::ChecksumMismatch { .. },
                ..
            }
        )
    }

    /// Get the appropriate exit code for this error
    pub const fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidPath(_) | Error::Config(_) => 2,    // UsageError
            Error::InvalidType(_) | Error::ContainerDeleted(_) => 2,
            Error::Network(_) => 3,                           // NetworkError
            Error::UploadFailed {
                reason: UploadFailure::Transport { .. },
                ..
            } => 3,
            Error::Auth(_) => 4,                              // AuthError
            Error::NotFound(_) | Error::AccountNotFound(_) => 5, // NotFound
            Error::RequestFailed { status, .. } => match *status {
                401 | 403 => 4,
                404 => 5,
                409 => 6, // Conflict
                _ => 1,
            },
            _ => 1, // GeneralError
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_exit_codes() {
        assert_eq!(Error::InvalidPath("test".into()).exit_code(), 2);
        assert_eq!(Error::Config("test".into()).exit_code(), 2);
        assert_eq!(Error::InvalidType("shared".into()).exit_code(), 2);
        assert_eq!(Error::Network("test".into()).exit_code(), 3);
        assert_eq!(Error::Auth("test".into()).exit_code(), 4);
        assert_eq!(Error::NotFound("test".into()).exit_code(), 5);
        assert_eq!(Error::AccountNotFound("test".into()).exit_code(), 5);
        assert_eq!(Error::General("test".into()).exit_code(), 1);
    }

    #[test]
    fn test_request_failed_exit_codes() {
        assert_eq!(Error::request_failed("delete", "photos", 409).exit_code(), 6);
        assert_eq!(Error::request_failed("delete", "photos", 404).exit_code(), 5);
        assert_eq!(Error::request_failed("delete", "photos", 403).exit_code(), 4);
        assert_eq!(Error::request_failed("delete", "photos", 500).exit_code(), 1);
    }

    #[test]
    fn test_upload_failure_kinds() {
        let transport = Error::upload_transport("a.txt", Some(503), "HTTP 503");
        assert!(transport.is_retryable());
        assert!(!transport.is_checksum_mismatch());
        assert_eq!(transport.exit_code(), 3);

        let mismatch = Error::checksum_mismatch("a.txt", "abc", "def");
        assert!(!mismatch.is_retryable());
        assert!(mismatch.is_checksum_mismatch());
        assert_eq!(mismatch.exit_code(), 1);
    }

    #[test]
    fn test_contract_violations() {
        assert!(Error::InvalidType("x".into()).is_contract_violation());
        assert!(Error::ContainerDeleted("x".into()).is_contract_violation());
        assert!(!Error::request_failed("set type", "x", 500).is_contract_violation());
    }

    #[test]
    fn test_error_display() {
        let err = Error::AccountNotFound("main".into());
        assert_eq!(err.to_string(), "Account not found: main");

        let err = Error::request_failed("create directory", "photos/2024", 500);
        assert_eq!(
            err.to_string(),
            "create directory failed for 'photos/2024': HTTP 500"
        );

        let err = Error::checksum_mismatch("a.txt", "abc", "def");
        assert_eq!(
            err.to_string(),
            "Upload failed for 'a.txt': checksum mismatch (expected abc, got def)"
        );
    }
}
