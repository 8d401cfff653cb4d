//! cs-core: Core library for the cs object storage client
//!
//! This crate provides the core functionality for the cs CLI, including:
//! - Configuration and account management
//! - Path parsing
//! - The ordered [`Collection`] every listing is returned in
//! - The [`Container`] contract, its upload verification protocol, and the
//!   [`Storage`] factory
//!
//! The crate never speaks HTTP itself. Remote calls go through the
//! [`Transport`] trait, implemented by `cs-swift` and by test doubles.

pub mod account;
pub mod collection;
pub mod config;
pub mod container;
pub mod error;
pub mod files;
pub mod path;
pub mod storage;
pub mod transport;
pub mod upload;

#[cfg(test)]
mod test_support;

pub use account::{Account, AccountManager, TimeoutConfig};
pub use collection::{Collection, Cursor, Key};
pub use config::{Config, ConfigManager};
pub use container::{Container, ContainerInfo, ContainerType, RemoteContainer};
pub use error::{Error, Result, UploadFailure};
pub use files::{FileInfo, FilesLoader};
pub use path::{RemotePath, parse_remote};
pub use storage::Storage;
pub use transport::{BodyStream, Method, Request, Resource, Response, Transport};
pub use upload::{UploadParams, UploadVerifier};
