//! CLI argument definitions using clap derive

use crate::cache::Strategy;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Memo - duplicate-suppressing memoizing cache
///
/// Fetches keys through a cache that runs each fetch at most once, no
/// matter how many concurrent requests ask for the same key.
#[derive(Parser, Debug)]
#[command(name = "memo")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "MEMO_CONFIG")]
    pub config: Option<PathBuf>,

    /// Skip local .memo.toml discovery
    #[arg(long, global = true)]
    pub no_local: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch URLs concurrently through the cache
    Fetch(FetchArgs),

    /// Drive the cache with a synthetic, delayed fetcher
    Simulate(SimulateArgs),

    /// Show or edit configuration
    Config(ConfigArgs),
}

/// Arguments for the fetch command
#[derive(Parser, Debug)]
pub struct FetchArgs {
    /// URLs to fetch (defaults to pipeline.urls from config)
    pub urls: Vec<String>,

    /// Cache strategy (defaults to cache.strategy from config)
    #[arg(short, long, value_enum)]
    pub strategy: Option<Strategy>,

    /// Replay the URL list this many extra times (defaults to pipeline.repeat)
    #[arg(short, long)]
    pub repeat: Option<u32>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

/// Arguments for the simulate command
#[derive(Parser, Debug)]
pub struct SimulateArgs {
    /// Keys to request; keys starting with "bad" fail
    #[arg(default_values = ["a", "b", "bad"])]
    pub keys: Vec<String>,

    /// Cache strategy (defaults to cache.strategy from config)
    #[arg(short, long, value_enum)]
    pub strategy: Option<Strategy>,

    /// Replay the key list this many extra times
    #[arg(short, long, default_value = "3")]
    pub repeat: u32,

    /// Delay of every simulated fetch, in milliseconds
    #[arg(long, default_value = "200")]
    pub delay_ms: u64,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}

/// Output format for response lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per response
    Json,
}
