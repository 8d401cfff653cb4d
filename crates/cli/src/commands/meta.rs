//! meta command - Replace container metadata
//!
//! The given pairs become the complete metadata of the container. Keys that
//! are not listed are removed; no pairs at all clears the metadata.

use std::collections::BTreeMap;

use clap::Args;
use cs_core::Container;
use serde::Serialize;

use super::remote::{connect, parse_target, report};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Replace the metadata of a container
#[derive(Args, Debug)]
pub struct MetaArgs {
    /// Container path (account/container)
    pub target: String,

    /// Metadata entries as KEY=VALUE
    #[arg(value_name = "KEY=VALUE")]
    pub pairs: Vec<String>,
}

#[derive(Debug, Serialize)]
struct MetaOutput<'a> {
    container: &'a str,
    metadata: &'a BTreeMap<String, String>,
}

/// Parse KEY=VALUE arguments
fn parse_pairs(pairs: &[String]) -> Result<BTreeMap<String, String>, String> {
    let mut meta = BTreeMap::new();
    for pair in pairs {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| format!("Invalid metadata entry '{pair}'. Expected KEY=VALUE"))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(format!("Metadata entry '{pair}' has an empty key"));
        }
        if key.eq_ignore_ascii_case(cs_core::container::TYPE_META_KEY) {
            return Err("Use 'cs set-type' to change the container type".to_string());
        }
        meta.insert(key.to_string(), value.to_string());
    }
    Ok(meta)
}

/// Execute the meta command
pub async fn execute(args: MetaArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let meta = match parse_pairs(&args.pairs) {
        Ok(meta) => meta,
        Err(e) => {
            formatter.error(&e);
            return ExitCode::UsageError;
        }
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

    match container.set_meta(meta).await {
        Ok(()) => {
            if formatter.is_json() {
                formatter.json(&MetaOutput {
                    container: container.name(),
                    metadata: container.metadata(),
                });
            } else {
                formatter.success(&format!(
                    "Metadata of '{path}' replaced ({} entries).",
                    container.metadata().len()
                ));
            }
            ExitCode::Success
        }
        Err(e) => report(&formatter, &e),
    }
}
