//! cs-swift: Swift transport for the cs client
//!
//! This crate provides the implementation of the Transport trait over the
//! Swift HTTP API using reqwest. It is the only crate that speaks HTTP.

pub mod auth;
pub mod client;

pub use auth::{Session, authenticate};
pub use client::SwiftClient;
