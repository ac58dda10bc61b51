//! Configuration schema for depstash
//!
//! Configuration is stored at `~/.config/depstash/config.toml`, with an
//! optional per-project `.depstash.toml` overlay.

use crate::strategy::DEFAULT_DEPENDENCY_GLOB;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Interpreter settings
    pub python: PythonConfig,

    /// Cache key settings
    pub cache: CacheConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Enable verbose logging
    pub verbose: bool,

    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            log_format: "text".to_string(),
        }
    }
}

/// Interpreter configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PythonConfig {
    /// Interpreter version used in cache keys; probed when unset
    pub version: Option<String>,
}

/// Cache key configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Package-manager identifier
    pub manager: String,

    /// Glob selecting the dependency-declaration files
    pub dependency_glob: String,

    /// Directory the glob is evaluated in (defaults to the current directory)
    pub working_directory: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            manager: "pip".to_string(),
            dependency_glob: DEFAULT_DEPENDENCY_GLOB.to_string(),
            working_directory: None,
        }
    }
}
