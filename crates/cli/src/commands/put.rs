//! put command - Upload a local file
//!
//! Files are read into memory and verified against their MD5 by default.
//! With `--stream` the file is sent in chunks while being read.

use std::path::{Path, PathBuf};

use clap::Args;
use cs_core::{Container, Error, RemotePath, UploadParams};
use serde::Serialize;

use super::remote::{connect, parse_target, report};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig, ProgressBar, format_size};

/// Upload a local file to a container
#[derive(Args, Debug)]
pub struct PutArgs {
    /// Local file to upload
    pub file: PathBuf,

    /// Destination (account/container[/path]); a trailing '/' keeps the file name
    pub target: String,

    /// Send the file in chunks instead of reading it into memory
    #[arg(long)]
    pub stream: bool,

    /// Skip checksum verification
    #[arg(long)]
    pub no_verify: bool,

    /// Content type (guessed from the file name by default)
    #[arg(long)]
    pub content_type: Option<String>,

    /// Remove the uploaded file after this many seconds
    #[arg(long, value_name = "SECONDS")]
    pub delete_after: Option<u64>,
}

#[derive(Debug, Serialize)]
struct PutOutput {
    status: &'static str,
    source: String,
    target: String,
    size_bytes: u64,
    size_human: String,
    etag: String,
    verified: bool,
}

/// Object path inside the container for `file`
fn object_path(path: &RemotePath, file: &Path) -> Result<String, Error> {
    if !path.path.is_empty() && !path.is_dir() {
        return Ok(path.path.clone());
    }
    let name = file
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| Error::InvalidPath(format!("Cannot upload '{}'", file.display())))?;
    Ok(format!("{}{name}", path.path))
}

fn upload_params(args: &PutArgs, object: &str) -> UploadParams {
    let content_type = args.content_type.clone().unwrap_or_else(|| {
        mime_guess::from_path(object)
            .first_or_octet_stream()
            .to_string()
    });
    let mut params = UploadParams::new().content_type(content_type);
    if let Some(seconds) = args.delete_after {
        params = params.delete_after(seconds);
    }
    params
}

/// Execute the put command
pub async fn execute(args: PutArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config.clone());

    let path = match parse_target(&args.target, &formatter) {
        Ok(path) => path,
        Err(code) => return code,
    };
    if let Err(e) = path.require_container() {
        return report(&formatter, &e);
    }
    let object = match object_path(&path, &args.file) {
        Ok(object) => object,
        Err(e) => return report(&formatter, &e),
    };

    let size = match tokio::fs::metadata(&args.file).await {
        Ok(meta) if meta.is_file() => meta.len(),
        Ok(_) => {
            formatter.error(&format!("'{}' is not a file", args.file.display()));
            return ExitCode::UsageError;
        }
        Err(e) => {
            formatter.error(&format!("Cannot read '{}': {e}", args.file.display()));
            return ExitCode::NotFound;
        }
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
    let params = upload_params(&args, &object);
    let result = if args.stream {
        let file = match tokio::fs::File::open(&args.file).await {
            Ok(file) => file,
            Err(e) => {
                formatter.error(&format!("Cannot open '{}': {e}", args.file.display()));
                return ExitCode::GeneralError;
            }
        };
        let progress = ProgressBar::new(&output_config, size);
        let mut reader = progress.wrap_reader(file);
        let result = container
            .upload_from_stream(&object, reader.as_mut(), params.hash_stream(verify))
            .await;
        progress.finish_and_clear();
        result
    } else {
        let contents = match tokio::fs::read(&args.file).await {
            Ok(contents) => contents,
            Err(e) => {
                formatter.error(&format!("Cannot read '{}': {e}", args.file.display()));
                return ExitCode::GeneralError;
            }
        };
        let progress = ProgressBar::spinner(&output_config, "Uploading");
        let result = container
            .upload_from_bytes(&object, &contents, params, verify)
            .await;
        progress.finish_and_clear();
        result
    };

    match result {
        Ok(etag) => {
            let target = format!("{}/{}/{object}", path.account, container.name());
            if formatter.is_json() {
                formatter.json(&PutOutput {
                    status: "success",
                    source: args.file.display().to_string(),
                    target,
                    size_bytes: size,
                    size_human: format_size(size),
                    etag,
                    verified: verify,
                });
            } else {
                formatter.success(&format!(
                    "{} -> {target} ({})",
                    args.file.display(),
                    format_size(size)
                ));
            }
            ExitCode::Success
        }
        Err(e) => report(&formatter, &e),
    }
}
