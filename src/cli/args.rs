//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// depstash - cache keys and cache directories for CI dependency caching
///
/// Computes a deterministic cache key bundle from environment facts and a
/// hash of dependency files, and discovers the package manager's global
/// cache directory.
#[derive(Parser, Debug)]
#[command(name = "depstash")]
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
    #[arg(short, long, global = true, env = "DEPSTASH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Skip local .depstash.toml discovery
    #[arg(long, global = true)]
    pub no_local: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve the package manager's global cache directories
    Dirs(DirsArgs),

    /// Compute the cache key bundle (primary key + restore keys)
    Keys(KeysArgs),

    /// Check toolchain health and show the facts keys are built from
    Status,

    /// Probe and repair the package-manager toolchain
    Setup(SetupArgs),

    /// Show configuration
    Config(ConfigArgs),
}

/// Output rendering for dirs/keys
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// One value per line
    Plain,
    /// JSON object
    Json,
    /// name=value lines for CI step outputs
    Github,
}

/// Arguments for the dirs command
#[derive(Parser, Debug)]
pub struct DirsArgs {
    /// Output format
    #[arg(long, value_enum, default_value = "plain")]
    pub format: OutputFormat,
}

/// Arguments for the keys command
#[derive(Parser, Debug)]
pub struct KeysArgs {
    /// Output format
    #[arg(long, value_enum, default_value = "plain")]
    pub format: OutputFormat,

    /// Interpreter version used in the key (probed when not given)
    #[arg(long, env = "DEPSTASH_PYTHON_VERSION")]
    pub python_version: Option<String>,

    /// Glob selecting dependency files (overrides config)
    #[arg(long)]
    pub dependency_path: Option<String>,

    /// Project directory to fingerprint (defaults to current directory)
    #[arg(short, long)]
    pub project: Option<PathBuf>,
}

/// Arguments for the setup command
#[derive(Parser, Debug)]
pub struct SetupArgs {
    /// Probe only, don't install anything
    #[arg(long)]
    pub check: bool,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Print the config file path
    Path,
}
