//! Path parsing
//!
//! Remote paths have the format `account[/container[/path]]`.

use crate::account::is_valid_account_name;
use crate::error::{Error, Result};

/// A parsed remote path pointing at an account, a container or a path inside it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemotePath {
    pub account: String,
    /// Container name (empty for the account root)
    pub container: String,
    /// Path inside the container (empty for the container root)
    pub path: String,
}

impl RemotePath {
    pub fn new(
        account: impl Into<String>,
        container: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            account: account.into(),
            container: container.into(),
            path: path.into(),
        }
    }

    /// Whether the path addresses a directory (container root or trailing slash)
    pub fn is_dir(&self) -> bool {
        self.path.is_empty() || self.path.ends_with('/')
    }

    /// Fail unless a container is named
    pub fn require_container(&self) -> Result<&str> {
        if self.container.is_empty() {
            return Err(Error::InvalidPath(format!(
                "'{self}' names no container. Use format: account/container"
            )));
        }
        Ok(&self.container)
    }

    /// Fail unless a path inside the container is named
    pub fn require_path(&self) -> Result<&str> {
        self.require_container()?;
        let path = self.path.trim_matches('/');
        if path.is_empty() {
            return Err(Error::InvalidPath(format!(
                "'{self}' names no path. Use format: account/container/path"
            )));
        }
        Ok(path)
    }

    /// Join a child path component
    pub fn join(&self, child: &str) -> Self {
        let base = self.path.trim_end_matches('/');
        let child = child.trim_start_matches('/');
        let path = if base.is_empty() {
            child.to_string()
        } else {
            format!("{base}/{child}")
        };
        Self {
            account: self.account.clone(),
            container: self.container.clone(),
            path,
        }
    }
}

impl std::fmt::Display for RemotePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.account)?;
        if !self.container.is_empty() {
            write!(f, "/{}", self.container)?;
        }
        if !self.path.is_empty() {
            write!(f, "/{}", self.path)?;
        }
        Ok(())
    }
}

/// Parse `account[/container[/path]]`
pub fn parse_remote(input: &str) -> Result<RemotePath> {
    if input.is_empty() {
        return Err(Error::InvalidPath("Path cannot be empty".into()));
    }

    let mut parts = input.splitn(3, '/');
    let account = parts.next().unwrap_or_default();
    let container = parts.next().unwrap_or_default();
    let path = parts.next().unwrap_or_default();

    if !is_valid_account_name(account) {
        return Err(Error::InvalidPath(format!(
            "Invalid account name in '{input}'. Use format: account/container[/path]"
        )));
    }
    if container.is_empty() && !path.is_empty() {
        return Err(Error::InvalidPath("Container name cannot be empty".into()));
    }

    Ok(RemotePath::new(account, container, path))
}
