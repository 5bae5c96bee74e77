//! Memo - duplicate-suppressing memoizing cache
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use memo::cli::{Cli, Commands};
use memo::config::ConfigManager;
use memo::error::{MemoError, MemoResult};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> MemoResult<()> {
    let cli = Cli::parse();

    // Load configuration
    let config_manager = if let Some(ref path) = cli.config {
        ConfigManager::with_path(path.clone())
    } else {
        ConfigManager::new()
    };

    // Find local config unless --no-local is set
    let local_config_path = if cli.no_local {
        None
    } else {
        let cwd =
            std::env::current_dir().map_err(|e| MemoError::io("getting current directory", e))?;
        ConfigManager::find_local_config(&cwd)
    };

    let config = config_manager
        .load_merged(local_config_path.as_deref())
        .await?;

    // Initialize logging: 0 = warn, 1 = info, 2+ = debug
    let filter = match cli.verbose {
        0 => EnvFilter::new("memo=warn"),
        1 => EnvFilter::new("memo=info"),
        _ => EnvFilter::new("memo=debug"),
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time();
    if config.general.log_format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    if let Some(ref path) = local_config_path {
        debug!("Applied local config: {}", path.display());
    }

    // Dispatch to command
    match cli.command {
        Commands::Fetch(args) => memo::cli::commands::fetch(args, &config).await,
        Commands::Simulate(args) => memo::cli::commands::simulate(args, &config).await,
        Commands::Config(args) => {
            memo::cli::commands::config(args, &config, &config_manager).await
        }
    }
}
