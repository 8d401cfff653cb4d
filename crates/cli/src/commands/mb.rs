//! mb command - Make container
//!
//! Creates a new container with the requested visibility.

use clap::Args;
use cs_core::{Container, ContainerType, Error};
use serde::Serialize;

use super::remote::{connect, parse_target, report};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Create a container
#[derive(Args, Debug)]
pub struct MbArgs {
    /// Target path (account/container)
    pub target: String,

    /// Container type: public, private or gallery
    #[arg(long = "type", default_value = "private")]
    pub kind: String,

    /// Ignore error if container already exists
    #[arg(short = 'p', long)]
    pub ignore_existing: bool,
}

#[derive(Debug, Serialize)]
struct MbOutput {
    status: &'static str,
    container: String,
    #[serde(rename = "type")]
    kind: ContainerType,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

/// Execute the mb command
pub async fn execute(args: MbArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let path = match parse_target(args.target.trim_end_matches('/'), &formatter) {
        Ok(path) => path,
        Err(code) => return code,
    };
    let name = match path.require_container() {
        Ok(_) if !path.path.is_empty() => {
            formatter.error("Container names cannot contain '/'");
            return ExitCode::UsageError;
        }
        Ok(name) => name.to_string(),
        Err(e) => return report(&formatter, &e),
    };
    let kind: ContainerType = match args.kind.parse() {
        Ok(kind) => kind,
        Err(e) => return report(&formatter, &e),
    };

    let remote = match connect(&path, &formatter).await {
        Ok(remote) => remote,
        Err(code) => return code,
    };

    // PUT on an existing container succeeds, so existence is checked first
    match remote.storage.container(&name).await {
        Ok(existing) if args.ignore_existing => {
            let message = format!("Container '{path}' already exists");
            if formatter.is_json() {
                formatter.json(&MbOutput {
                    status: "success",
                    container: name,
                    kind: existing.container_type(),
                    message: Some(message),
                });
            } else {
                formatter.warning(&message);
            }
            return ExitCode::Success;
        }
        Ok(_) => {
            formatter.error(&format!("Container '{path}' already exists"));
            return ExitCode::Conflict;
        }
        Err(Error::NotFound(_)) => {}
        Err(e) => return report(&formatter, &e),
    }

    match remote.storage.create_container(&name, kind).await {
        Ok(container) => {
            if formatter.is_json() {
                formatter.json(&MbOutput {
                    status: "success",
                    container: name,
                    kind: container.container_type(),
                    message: None,
                });
            } else {
                formatter.success(&format!("Container '{path}' created ({kind})."));
            }
            ExitCode::Success
        }
        Err(e) => report(&formatter, &e),
    }
}
