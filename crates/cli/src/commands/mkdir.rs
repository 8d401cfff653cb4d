//! mkdir command - Create a directory inside a container

use clap::Args;
use cs_core::Container;
use serde::Serialize;

use super::remote::{connect, parse_target, report};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Create a directory inside a container
#[derive(Args, Debug)]
pub struct MkdirArgs {
    /// Directory path (account/container/dir)
    pub target: String,
}

#[derive(Debug, Serialize)]
struct MkdirOutput {
    status: &'static str,
    container: String,
    directory: String,
}

/// Execute the mkdir command
pub async fn execute(args: MkdirArgs, output_config: OutputConfig) -> ExitCode {
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

    match container.create_dir(&dir).await {
        Ok(directory) => {
            if formatter.is_json() {
                formatter.json(&MkdirOutput {
                    status: "success",
                    container: container.name().to_string(),
                    directory,
                });
            } else {
                formatter.success(&format!("Directory '{}/{directory}/' created.", container.name()));
            }
            ExitCode::Success
        }
        Err(e) => report(&formatter, &e),
    }
}
