//! Account management commands
//!
//! Accounts are named references to a storage service, holding the
//! authentication endpoint and credentials.

use clap::Subcommand;
use cs_core::{Account, AccountManager, TimeoutConfig};
use serde::Serialize;

use super::remote::report;
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

#[derive(Subcommand, Debug)]
pub enum AccountCommands {
    /// Add or update an account
    Set(SetArgs),

    /// List all configured accounts
    List(ListArgs),

    /// Remove an account
    Remove(RemoveArgs),
}

#[derive(clap::Args, Debug)]
pub struct SetArgs {
    /// Account name (e.g., "main", "backup")
    pub name: String,

    /// Authentication endpoint (e.g., "https://auth.example.com/auth/v1.0")
    pub auth_url: String,

    /// Account user
    pub user: String,

    /// Account key
    pub key: String,

    /// Public base address of containers (CDN domain)
    #[arg(long)]
    pub public_url: Option<String>,

    /// Allow insecure TLS connections
    #[arg(long, default_value = "false")]
    pub insecure: bool,

    /// Connection timeout in milliseconds
    #[arg(long)]
    pub connect_timeout_ms: Option<u64>,

    /// Read timeout in milliseconds
    #[arg(long)]
    pub read_timeout_ms: Option<u64>,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Show full details
    #[arg(short, long)]
    pub long: bool,
}

#[derive(clap::Args, Debug)]
pub struct RemoveArgs {
    pub name: String,
}

#[derive(Serialize)]
struct AccountListOutput {
    accounts: Vec<AccountInfo>,
}

/// Account information for output, without the key
#[derive(Serialize)]
struct AccountInfo {
    name: String,
    auth_url: String,
    user: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    public_url: Option<String>,
    insecure: bool,
}

impl From<&Account> for AccountInfo {
    fn from(account: &Account) -> Self {
        Self {
            name: account.name.clone(),
            auth_url: account.auth_url.clone(),
            user: account.user.clone(),
            public_url: account.public_url.clone(),
            insecure: account.insecure,
        }
    }
}

#[derive(Serialize)]
struct AccountOperationOutput {
    success: bool,
    account: String,
    message: String,
}

/// Execute an account subcommand
pub fn execute(cmd: AccountCommands, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);
    let manager = match AccountManager::new() {
        Ok(manager) => manager,
        Err(e) => return report(&formatter, &e),
    };

    match cmd {
        AccountCommands::Set(args) => execute_set(args, &manager, &formatter),
        AccountCommands::List(args) => execute_list(args, &manager, &formatter),
        AccountCommands::Remove(args) => execute_remove(args, &manager, &formatter),
    }
}

fn build_account(args: SetArgs) -> Account {
    let mut account = Account::new(args.name, args.auth_url, args.user, args.key);
    account.public_url = args.public_url;
    account.insecure = args.insecure;
    if args.connect_timeout_ms.is_some() || args.read_timeout_ms.is_some() {
        let defaults = TimeoutConfig::default();
        account.timeout = Some(TimeoutConfig {
            connect_ms: args.connect_timeout_ms.unwrap_or(defaults.connect_ms),
            read_ms: args.read_timeout_ms.unwrap_or(defaults.read_ms),
        });
    }
    account
}

fn execute_set(args: SetArgs, manager: &AccountManager, formatter: &Formatter) -> ExitCode {
    if args.user.is_empty() || args.key.is_empty() {
        formatter.error("Account user and key cannot be empty");
        return ExitCode::UsageError;
    }

    let account = build_account(args);
    let name = account.name.clone();

    match manager.set(account) {
        Ok(()) => {
            let message = format!("Account '{name}' configured successfully");
            if formatter.is_json() {
                formatter.json(&AccountOperationOutput {
                    success: true,
                    account: name,
                    message,
                });
            } else {
                formatter.success(&message);
            }
            ExitCode::Success
        }
        Err(e @ (cs_core::Error::Config(_) | cs_core::Error::InvalidUrl(_))) => {
            formatter.error(&e.to_string());
            ExitCode::UsageError
        }
        Err(e) => report(formatter, &e),
    }
}

fn execute_list(args: ListArgs, manager: &AccountManager, formatter: &Formatter) -> ExitCode {
    let accounts = match manager.list() {
        Ok(accounts) => accounts,
        Err(e) => return report(formatter, &e),
    };

    if formatter.is_json() {
        formatter.json(&AccountListOutput {
            accounts: accounts.iter().map(AccountInfo::from).collect(),
        });
    } else if accounts.is_empty() {
        formatter.println("No accounts configured.");
    } else if args.long {
        for account in &accounts {
            let public = account.public_url.as_deref().unwrap_or("-");
            formatter.println(&format!(
                "{:<12} {} (user: {}, public: {public})",
                account.name, account.auth_url, account.user
            ));
        }
    } else {
        for account in &accounts {
            formatter.println(&format!("{:<12} {}", account.name, account.auth_url));
        }
    }
    ExitCode::Success
}

fn execute_remove(args: RemoveArgs, manager: &AccountManager, formatter: &Formatter) -> ExitCode {
    match manager.remove(&args.name) {
        Ok(()) => {
            let message = format!("Account '{}' removed successfully", args.name);
            if formatter.is_json() {
                formatter.json(&AccountOperationOutput {
                    success: true,
                    account: args.name,
                    message,
                });
            } else {
                formatter.success(&message);
            }
            ExitCode::Success
        }
        Err(e) => report(formatter, &e),
    }
}
