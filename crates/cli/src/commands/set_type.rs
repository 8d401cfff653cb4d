//! set-type command - Change container visibility

use clap::Args;
use cs_core::{Container, ContainerType};
use serde::Serialize;

use super::remote::{connect, container_label, parse_target, report};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Change the visibility of a container
#[derive(Args, Debug)]
pub struct SetTypeArgs {
    /// Container path (account/container)
    pub target: String,

    /// New type: public, private or gallery
    #[arg(value_name = "TYPE")]
    pub kind: String,
}

#[derive(Debug, Serialize)]
struct SetTypeOutput {
    container: String,
    previous: ContainerType,
    #[serde(rename = "type")]
    kind: ContainerType,
}

/// Execute the set-type command
pub async fn execute(args: SetTypeArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    // Rejected before any connection is made
    let kind: ContainerType = match args.kind.parse() {
        Ok(kind) => kind,
        Err(e) => return report(&formatter, &e),
    };
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

    let previous = container.container_type();
    match container.set_type(kind).await {
        Ok(kind) => {
            if formatter.is_json() {
                formatter.json(&SetTypeOutput {
                    container: container.name().to_string(),
                    previous,
                    kind,
                });
            } else {
                formatter.success(&format!("Container {} updated.", container_label(&container)));
            }
            ExitCode::Success
        }
        Err(e) => report(&formatter, &e),
    }
}
