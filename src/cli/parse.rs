//! CLI parse: clap types for postsmith. No behavior; definitions only.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// postsmith - generate, review and publish social posts
#[derive(Parser)]
#[command(name = "postsmith")]
#[command(about = "Topic-to-post content pipeline with a bounded review loop")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory (where config/ lives)
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging and progress events
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Disable logging entirely
    #[arg(long, default_value = "false")]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the workflow once for a niche and publish the result
    Run {
        /// Topic niche, e.g. "cloud computing"
        niche: String,
        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Show completed and failed run totals
    Summary {
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// List saved post records, newest first
    Posts {
        /// Maximum number of records
        #[arg(long, default_value = "10")]
        limit: usize,
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Validate configuration and report every problem
    Validate {
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}
