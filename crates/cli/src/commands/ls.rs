//! ls command - List containers and files
//!
//! Lists containers when given an account only, or the files of a container
//! directory otherwise.

use clap::Args;
use cs_core::{Collection, Container, ContainerInfo, FileInfo, RemotePath};
use serde::Serialize;

use super::remote::{Remote, connect, parse_target, report};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig, format_size};

/// List containers or files
#[derive(Args, Debug)]
pub struct LsArgs {
    /// Remote path (account[/container[/dir]])
    pub path: String,

    /// List every file below the directory, not only direct children
    #[arg(short, long)]
    pub recursive: bool,

    /// Maximum number of entries
    #[arg(long)]
    pub limit: Option<usize>,

    /// Start listing after this path
    #[arg(long)]
    pub after: Option<String>,

    /// Summarize output (show totals only)
    #[arg(long)]
    pub summarize: bool,
}

#[derive(Debug, Serialize)]
struct Summary {
    total: usize,
    total_size_bytes: u64,
    total_size_human: String,
}

impl Summary {
    fn new(total: usize, bytes: u64) -> Self {
        Self {
            total,
            total_size_bytes: bytes,
            total_size_human: format_size(bytes),
        }
    }
}

#[derive(Serialize)]
struct LsOutput<'a, T: Serialize> {
    items: &'a Collection<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<Summary>,
}

/// Execute the ls command
pub async fn execute(args: LsArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let path = match parse_target(args.path.trim_end_matches('/'), &formatter) {
        Ok(path) => path,
        Err(code) => return code,
    };

    let remote = match connect(&path, &formatter).await {
        Ok(remote) => remote,
        Err(code) => return code,
    };

    if path.container.is_empty() {
        list_containers(&remote, &args, &formatter).await
    } else {
        list_files(&remote, &path, &args, &formatter).await
    }
}

async fn list_containers(remote: &Remote, args: &LsArgs, formatter: &Formatter) -> ExitCode {
    let containers = match remote.storage.containers().await {
        Ok(containers) => containers,
        Err(e) => return report(formatter, &e),
    };

    let total_size = containers.values().map(|c| c.size_bytes).sum();
    let summary = args
        .summarize
        .then(|| Summary::new(containers.count(), total_size));

    if formatter.is_json() {
        formatter.json(&LsOutput {
            items: &containers,
            summary,
        });
        return ExitCode::Success;
    }

    for (_, info) in &containers {
        formatter.println(&container_line(info));
    }
    if let Some(summary) = summary {
        formatter.println(&format!(
            "\nTotal: {} containers, {}",
            summary.total, summary.total_size_human
        ));
    }
    ExitCode::Success
}

async fn list_files(
    remote: &Remote,
    path: &RemotePath,
    args: &LsArgs,
    formatter: &Formatter,
) -> ExitCode {
    let container = match remote.container(path, formatter).await {
        Ok(container) => container,
        Err(code) => return code,
    };

    let mut loader = if args.recursive {
        let prefix = path.path.trim_matches('/');
        let loader = container.files();
        if prefix.is_empty() {
            loader
        } else {
            loader.with_prefix(format!("{prefix}/"))
        }
    } else {
        container.files().from_directory(&path.path)
    };
    if let Some(limit) = args.limit {
        loader = loader.limit(limit);
    }
    if let Some(after) = &args.after {
        loader = loader.after(after);
    }

    let files = match loader.get().await {
        Ok(files) => files,
        Err(e) => return report(formatter, &e),
    };

    let total_size = files.values().map(|f| f.size_bytes).sum();
    let total_files = files.values().filter(|f| !f.is_dir).count();
    let summary = args.summarize.then(|| Summary::new(total_files, total_size));

    if formatter.is_json() {
        formatter.json(&LsOutput {
            items: &files,
            summary,
        });
        return ExitCode::Success;
    }

    for (_, file) in &files {
        formatter.println(&file_line(file));
    }
    if let Some(summary) = summary {
        formatter.println(&format!(
            "\nTotal: {} files, {}",
            summary.total, summary.total_size_human
        ));
    }
    ExitCode::Success
}

fn container_line(info: &ContainerInfo) -> String {
    format!(
        "{:<8} {:>6} files {:>10}  {}/",
        info.kind,
        info.files_count,
        format_size(info.size_bytes),
        info.name
    )
}

fn file_line(file: &FileInfo) -> String {
    let date = file
        .modified_at()
        .map(|d| d.strftime("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| " ".repeat(19));

    if file.is_dir {
        let name = file.path.trim_end_matches('/');
        format!("[{date}] {:>10} {name}/", "DIR")
    } else {
        format!("[{date}] {:>10} {}", file.size_human, file.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cs_core::ContainerType;

    #[test]
    fn test_container_line() {
        let mut info = ContainerInfo::new("photos", ContainerType::Public);
        info.files_count = 3;
        info.size_bytes = 2048;

        let line = container_line(&info);
        assert!(line.starts_with("public"));
        assert!(line.contains("3 files"));
        assert!(line.contains("2 KiB"));
        assert!(line.ends_with("photos/"));
    }

    #[test]
    fn test_file_line() {
        let mut file = FileInfo::file("docs/readme.txt", 2048);
        file.last_modified = Some("2024-01-31T08:15:00.123456".to_string());
        let line = file_line(&file);
        assert!(line.starts_with("[2024-01-31 08:15:00]"));
        assert!(line.ends_with("2 KiB docs/readme.txt"));

        let line = file_line(&FileInfo::dir("docs/old/"));
        assert!(line.ends_with("DIR docs/old/"));
    }

    #[test]
    fn test_summary() {
        let summary = Summary::new(2, 4096);
        assert_eq!(summary.total_size_human, "4 KiB");
    }
}
