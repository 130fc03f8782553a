use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};

use crate::cli::flags::Cli;
use crate::core::output::OutputFormat;

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub config_path: Option<String>,
    pub format: OutputFormat,
    pub output: Option<PathBuf>,
}

pub fn resolve_config(cli: &Cli) -> RunConfig {
    RunConfig {
        config_path: cli.config.clone(),
        format: cli.format.into(),
        output: cli.output.clone(),
    }
}

/// Positional URLs followed by those read from `file`, in order.
pub fn collect_batch_urls(urls: &[String], file: Option<&Path>) -> Result<Vec<String>> {
    let mut out: Vec<String> = urls.to_vec();
    if let Some(path) = file {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("reading url list {}", path.display()))?;
        out.extend(
            data.lines()
                .map(str::trim)
                .filter(|l| !l.is_empty() && !l.starts_with('#'))
                .map(str::to_string),
        );
    }
    if out.is_empty() {
        return Err(anyhow!("no urls given; pass urls or --file"));
    }
    Ok(out)
}
