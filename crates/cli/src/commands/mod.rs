//! CLI command definitions and execution
//!
//! Each command lives in its own module, parses its arguments, reports
//! through the shared [`Formatter`](crate::output::Formatter) and returns an
//! [`ExitCode`].

use clap::{Parser, Subcommand};
use cs_core::ConfigManager;
use cs_core::config::Defaults;

use crate::exit_code::ExitCode;
use crate::output::OutputConfig;

mod account;
mod completions;
mod ls;
mod mb;
mod meta;
mod mkdir;
mod pipe;
mod put;
mod rb;
mod remote;
mod rmdir;
mod set_type;
mod stat;

/// cs - cloud storage container client
///
/// A command-line interface for Swift-compatible object storage containers.
#[derive(Parser, Debug)]
#[command(name = "cs")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format: human-readable or JSON
    #[arg(long, global = true, default_value = "false")]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true, default_value = "false")]
    pub no_color: bool,

    /// Disable progress bar
    #[arg(long, global = true, default_value = "false")]
    pub no_progress: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, default_value = "false")]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long, global = true, default_value = "false")]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage storage accounts
    #[command(subcommand)]
    Account(account::AccountCommands),

    /// List containers or files
    Ls(ls::LsArgs),

    /// Show container or file details
    Stat(stat::StatArgs),

    /// Create a container
    Mb(mb::MbArgs),

    /// Remove an empty container
    Rb(rb::RbArgs),

    /// Change the visibility of a container
    SetType(set_type::SetTypeArgs),

    /// Replace the metadata of a container
    Meta(meta::MetaArgs),

    /// Create a directory inside a container
    Mkdir(mkdir::MkdirArgs),

    /// Remove a directory from a container
    Rmdir(rmdir::RmdirArgs),

    /// Upload a local file
    Put(put::PutArgs),

    /// Stream stdin to a file
    Pipe(pipe::PipeArgs),

    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}

/// Merge global flags with the configured defaults; flags only ever enable
fn output_config(cli: &Cli, defaults: &Defaults) -> OutputConfig {
    OutputConfig {
        json: cli.json || defaults.output.eq_ignore_ascii_case("json"),
        no_color: cli.no_color || defaults.color.eq_ignore_ascii_case("never"),
        no_progress: cli.no_progress || !defaults.progress,
        quiet: cli.quiet,
    }
}

/// Execute the CLI command and return an exit code
pub async fn execute(cli: Cli) -> ExitCode {
    // An unreadable config is reported by the command that needs it
    let defaults = ConfigManager::new()
        .and_then(|manager| manager.load())
        .map(|config| config.defaults)
        .unwrap_or_default();
    let output_config = output_config(&cli, &defaults);

    match cli.command {
        Commands::Account(cmd) => account::execute(cmd, output_config),
        Commands::Ls(args) => ls::execute(args, output_config).await,
        Commands::Stat(args) => stat::execute(args, output_config).await,
        Commands::Mb(args) => mb::execute(args, output_config).await,
        Commands::Rb(args) => rb::execute(args, output_config).await,
        Commands::SetType(args) => set_type::execute(args, output_config).await,
        Commands::Meta(args) => meta::execute(args, output_config).await,
        Commands::Mkdir(args) => mkdir::execute(args, output_config).await,
        Commands::Rmdir(args) => rmdir::execute(args, output_config).await,
        Commands::Put(args) => put::execute(args, output_config).await,
        Commands::Pipe(args) => pipe::execute(args, output_config).await,
        Commands::Completions(args) => completions::execute(args),
    }
}
