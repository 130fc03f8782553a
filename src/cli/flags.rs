use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::core::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(
    name = "lure-scan",
    version,
    about = "Score URLs for phishing, scam and malware risk"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Path to config file (TOML). Default: config/lure-scan.toml
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Output format
    #[arg(long, value_enum, global = true, default_value = "json")]
    pub format: OutputFormatArg,

    /// Write the report to this file instead of stdout
    #[arg(long, global = true)]
    pub output: Option<PathBuf>,

    /// Increase verbosity (debug, trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log file path
    #[arg(long, global = true, default_value = "data/lure-scan.log")]
    pub log_file: String,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Domain-only check; no page fetch, no AI
    Check {
        url: String,
    },
    /// Full analysis: render, heuristics, optional AI fusion
    Analyze {
        url: String,
        /// Use a captured page (JSON) instead of fetching
        #[arg(long, conflicts_with = "no_render")]
        page: Option<PathBuf>,
        /// Skip rendering; score the URL and navigation only
        #[arg(long)]
        no_render: bool,
        /// Skip the AI classifier even if configured
        #[arg(long)]
        no_ai: bool,
        /// Overall deadline in milliseconds
        #[arg(long)]
        deadline_ms: Option<u64>,
    },
    /// Quick-check several URLs
    Batch {
        urls: Vec<String>,
        /// File with one URL per line (# starts a comment)
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum OutputFormatArg {
    Json,
    Jsonl,
    Markdown,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(value: OutputFormatArg) -> Self {
        match value {
            OutputFormatArg::Json => OutputFormat::Json,
            OutputFormatArg::Jsonl => OutputFormat::Jsonl,
            OutputFormatArg::Markdown => OutputFormat::Markdown,
        }
    }
}
