//! rmdir command - Remove a directory marker from a container
//!
//! Removing a directory that does not exist succeeds.

use clap::Args;
use cs_core::Container;
use serde::Serialize;

use super::remote::{connect, parse_target, report};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Remove a directory from a container
#[derive(Args, Debug)]
pub struct RmdirArgs {
    /// Directory path (account/container/dir)
    pub target: String,
}

#[derive(Debug, Serialize)]
struct RmdirOutput {
    status: &'static str,
    container: String,
    directory: String,
}

/// Execute the rmdir command
pub async fn execute(args: RmdirArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let path = match parse_target(&args.target, &formatter) {
        Ok(path) => path,
        Err(code) => return code,
    };
    let dir = match path.require_path() {
        Ok(dir) => dir.to_string(),
        Err(e) => return report(&formatter, &e),
    };

    let remote = match connect(&path, &formatter).await {
        Ok(remote) => remote,
        Err(code) => return code,
    };
    let container = match remote.container(&path, &formatter).await {
        Ok(container) => container,
        Err(code) => return code,
    };

    match container.delete_dir(&dir).await {
        Ok(()) => {
            if formatter.is_json() {
                formatter.json(&RmdirOutput {
                    status: "success",
                    container: container.name().to_string(),
                    directory: dir,
                });
            } else {
                formatter.success(&format!("Directory '{}/{dir}/' removed.", container.name()));
            }
            ExitCode::Success
        }
        Err(e) => report(&formatter, &e),
    }
}
