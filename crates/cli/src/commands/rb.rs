//! rb command - Remove container
//!
//! Deletes an empty container. The service refuses to delete a container
//! that still holds files.

use clap::Args;
use cs_core::{Container, Error};
use serde::Serialize;

use super::remote::{connect, container_label, parse_target, report};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Remove an empty container
#[derive(Args, Debug)]
pub struct RbArgs {
    /// Container path (account/container)
    pub target: String,
}

#[derive(Debug, Serialize)]
struct RbOutput {
    status: &'static str,
    container: String,
}

/// Execute the rb command
pub async fn execute(args: RbArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let path = match parse_target(args.target.trim_end_matches('/'), &formatter) {
        Ok(path) => path,
        Err(code) => return code,
    };

    let remote = match connect(&path, &formatter).await {
        Ok(remote) => remote,
        Err(code) => return code,
    };
    let mut container = match remote.container(&path, &formatter).await {
        Ok(container) => container,
        Err(code) => return code,
    };

    let label = container_label(&container);
    match container.delete().await {
        Ok(()) => {
            if formatter.is_json() {
                formatter.json(&RbOutput {
                    status: "success",
                    container: container.name().to_string(),
                });
            } else {
                formatter.success(&format!("Container {label} removed."));
            }
            ExitCode::Success
        }
        Err(Error::RequestFailed { status: 409, .. }) => {
            formatter.error(&format!(
                "Container '{path}' is not empty ({} files)",
                container.files_count()
            ));
            ExitCode::Conflict
        }
        Err(e) => report(&formatter, &e),
    }
}
