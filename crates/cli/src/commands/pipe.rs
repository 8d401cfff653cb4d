//! pipe command - Stream stdin to a file
//!
//! Reads from standard input until EOF and uploads the bytes as they arrive.

use clap::Args;
use cs_core::{Container, UploadParams};
use serde::Serialize;

use super::remote::{connect, parse_target, report};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig, ProgressBar};

/// Stream stdin to a file
#[derive(Args, Debug)]
pub struct PipeArgs {
    /// Destination file path (account/container/path)
    pub target: String,

    /// Content type
    #[arg(long, default_value = "application/octet-stream")]
    pub content_type: String,

    /// Skip checksum verification
    #[arg(long)]
    pub no_verify: bool,
}

#[derive(Debug, Serialize)]
struct PipeOutput {
    status: &'static str,
    target: String,
    etag: String,
}

/// Execute the pipe command
pub async fn execute(args: PipeArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config.clone());

    let path = match parse_target(&args.target, &formatter) {
        Ok(path) => path,
        Err(code) => return code,
    };
    let object = match path.require_path() {
        Ok(object) if !path.is_dir() => object.to_string(),
        Ok(_) => {
            formatter.error("Destination must be a file path, not a directory");
            return ExitCode::UsageError;
        }
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

    let verify = !args.no_verify && remote.defaults.verify_checksum;
    let params = UploadParams::new()
        .content_type(args.content_type)
        .hash_stream(verify);

    let progress = ProgressBar::spinner(&output_config, "Uploading");
    let mut reader = progress.wrap_reader(tokio::io::stdin());
    let result = container
        .upload_from_stream(&object, reader.as_mut(), params)
        .await;
    progress.finish_and_clear();

    match result {
        Ok(etag) => {
            if formatter.is_json() {
                formatter.json(&PipeOutput {
                    status: "success",
                    target: path.to_string(),
                    etag,
                });
            } else {
                formatter.success(&format!("stdin -> {path}"));
            }
            ExitCode::Success
        }
        Err(e) => report(&formatter, &e),
    }
}
