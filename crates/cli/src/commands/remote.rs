//! Shared plumbing for commands that talk to a storage account

use cs_core::config::Defaults;
use cs_core::{AccountManager, Container, Error, RemoteContainer, RemotePath, Storage, parse_remote};
use cs_swift::SwiftClient;

use crate::exit_code::ExitCode;
use crate::output::Formatter;

/// An authenticated account plus the configured defaults
pub(crate) struct Remote {
    pub storage: Storage<SwiftClient>,
    pub defaults: Defaults,
}

impl Remote {
    /// Fetch the container named by `path`
    pub async fn container(
        &self,
        path: &RemotePath,
        formatter: &Formatter,
    ) -> Result<RemoteContainer<SwiftClient>, ExitCode> {
        let name = path.require_container().map_err(|e| report(formatter, &e))?;
        self.storage
            .container(name)
            .await
            .map_err(|e| report(formatter, &e))
    }
}

/// Print `error` and return the exit code it maps to
pub(crate) fn report(formatter: &Formatter, error: &Error) -> ExitCode {
    formatter.error(&error.to_string());
    ExitCode::from_error(error)
}

/// Parse a remote path argument
pub(crate) fn parse_target(raw: &str, formatter: &Formatter) -> Result<RemotePath, ExitCode> {
    parse_remote(raw).map_err(|e| report(formatter, &e))
}

/// Load the account named by `path` and authenticate against it
pub(crate) async fn connect(path: &RemotePath, formatter: &Formatter) -> Result<Remote, ExitCode> {
    let manager = AccountManager::new().map_err(|e| report(formatter, &e))?;
    let defaults = manager
        .config_manager()
        .load()
        .map_err(|e| report(formatter, &e))?
        .defaults;
    let account = manager.get(&path.account).map_err(|e| report(formatter, &e))?;

    let client = SwiftClient::connect(&account)
        .await
        .map_err(|e| report(formatter, &e))?;
    let mut storage = Storage::new(client).map_err(|e| report(formatter, &e))?;
    if let Some(public_url) = &account.public_url {
        storage = storage
            .with_public_url(public_url)
            .map_err(|e| report(formatter, &e))?;
    }

    tracing::debug!(account = %account.name, "Storage ready");
    Ok(Remote { storage, defaults })
}

/// Describe a container for human output
pub(crate) fn container_label(container: &impl Container) -> String {
    format!("{} ({})", container.name(), container.container_type())
}
