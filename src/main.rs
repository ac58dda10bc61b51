//! depstash - CI dependency-cache helper
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use depstash::cli::{Cli, Commands};
use depstash::config::ConfigManager;
use depstash::error::DepstashResult;
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

async fn run() -> DepstashResult<()> {
    let cli = Cli::parse();

    // Initialize logging: 0 = warn, 1 = info, 2+ = debug
    let filter = match cli.verbose {
        0 => EnvFilter::new("depstash=warn"),
        1 => EnvFilter::new("depstash=info"),
        _ => EnvFilter::new("depstash=debug"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    // Load configuration
    let config_manager = if let Some(ref path) = cli.config {
        ConfigManager::with_path(path.clone())
    } else {
        ConfigManager::new()
    };

    // Find local config unless --no-local is set
    let local_config_path = if cli.no_local {
        debug!("Local config discovery disabled (--no-local)");
        None
    } else {
        let cwd = std::env::current_dir()
            .map_err(|e| depstash::error::DepstashError::io("getting current directory", e))?;
        let found = ConfigManager::find_local_config(&cwd);
        if let Some(ref path) = found {
            debug!("Found local config: {}", path.display());
        }
        found
    };

    let config = config_manager
        .load_merged(local_config_path.as_deref())
        .await?;

    // Dispatch to command
    match cli.command {
        Commands::Dirs(args) => depstash::cli::commands::dirs(args, &config).await,
        Commands::Keys(args) => depstash::cli::commands::keys(args, &config).await,
        Commands::Status => depstash::cli::commands::status(&config).await,
        Commands::Setup(args) => depstash::cli::commands::setup(args).await,
        Commands::Config(args) => {
            depstash::cli::commands::config(args, &config_manager, &config).await
        }
    }
}
