//! stat command - Show container or file details

use std::collections::BTreeMap;

use clap::Args;
use cs_core::{Container, ContainerType, Error, FileInfo};
use serde::Serialize;

use super::remote::{connect, parse_target, report};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig, format_size};

/// Show container or file details
#[derive(Args, Debug)]
pub struct StatArgs {
    /// Container or file path (account/container[/path])
    pub path: String,
}

#[derive(Debug, Serialize)]
struct ContainerStat {
    name: String,
    #[serde(rename = "type")]
    kind: ContainerType,
    url: String,
    files_count: u64,
    size_bytes: u64,
    size_human: String,
    uploaded_bytes: u64,
    downloaded_bytes: u64,
    metadata: BTreeMap<String, String>,
}

impl ContainerStat {
    fn new(container: &impl Container) -> Self {
        Self {
            name: container.name().to_string(),
            kind: container.container_type(),
            url: container.url(""),
            files_count: container.files_count(),
            size_bytes: container.size(),
            size_human: format_size(container.size()),
            uploaded_bytes: container.uploaded_bytes(),
            downloaded_bytes: container.downloaded_bytes(),
            metadata: container.metadata().clone(),
        }
    }

    fn print(&self, formatter: &Formatter) {
        formatter.println(&format!("Name      : {}", self.name));
        formatter.println(&format!("Type      : {}", self.kind));
        formatter.println(&format!("URL       : {}", self.url));
        formatter.println(&format!("Files     : {}", self.files_count));
        formatter.println(&format!("Size      : {} ({} bytes)", self.size_human, self.size_bytes));
        formatter.println(&format!("Uploaded  : {}", format_size(self.uploaded_bytes)));
        formatter.println(&format!("Downloaded: {}", format_size(self.downloaded_bytes)));
        for (key, value) in &self.metadata {
            formatter.println(&format!("Meta      : {key}={value}"));
        }
    }
}

#[derive(Debug, Serialize)]
struct FileStat {
    #[serde(flatten)]
    info: FileInfo,
    url: String,
}

impl FileStat {
    fn print(&self, formatter: &Formatter) {
        let info = &self.info;
        formatter.println(&format!("Name      : {}", info.path));
        if let Some(modified) = info.modified_at() {
            formatter.println(&format!(
                "Date      : {}",
                modified.strftime("%Y-%m-%d %H:%M:%S")
            ));
        }
        formatter.println(&format!("Size      : {} ({} bytes)", info.size_human, info.size_bytes));
        if let Some(etag) = &info.etag {
            formatter.println(&format!("ETag      : {etag}"));
        }
        if let Some(content_type) = &info.content_type {
            formatter.println(&format!("Type      : {content_type}"));
        }
        formatter.println(&format!("URL       : {}", self.url));
    }
}

/// Execute the stat command
pub async fn execute(args: StatArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let path = match parse_target(&args.path, &formatter) {
        Ok(path) => path,
        Err(code) => return code,
    };
    if let Err(e) = path.require_container() {
        return report(&formatter, &e);
    }

    let remote = match connect(&path, &formatter).await {
        Ok(remote) => remote,
        Err(code) => return code,
    };
    let container = match remote.container(&path, &formatter).await {
        Ok(container) => container,
        Err(code) => return code,
    };

    let file_path = path.path.trim_matches('/');
    if file_path.is_empty() {
        let stat = ContainerStat::new(&container);
        if formatter.is_json() {
            formatter.json(&stat);
        } else {
            stat.print(&formatter);
        }
        return ExitCode::Success;
    }

    match container.files().find(file_path).await {
        Ok(Some(info)) => {
            let stat = FileStat {
                url: container.url(&info.path),
                info,
            };
            if formatter.is_json() {
                formatter.json(&stat);
            } else {
                stat.print(&formatter);
            }
            ExitCode::Success
        }
        Ok(None) => report(
            &formatter,
            &Error::NotFound(format!("File not found: {}", args.path)),
        ),
        Err(e) => report(&formatter, &e),
    }
}
