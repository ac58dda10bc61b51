//! Error types for depstash
//!
//! All modules use `DepstashResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for depstash operations
pub type DepstashResult<T> = Result<T, DepstashError>;

/// All errors that can occur in depstash
#[derive(Error, Debug)]
pub enum DepstashError {
    // Toolchain errors
    #[error("Required tool not found: {name}. {hint}")]
    ToolNotFound { name: String, hint: String },

    #[error("Could not get cache folder path for {manager} package manager: {stderr}")]
    CacheDirectoryResolution { manager: String, stderr: String },

    #[error("Installation step failed: {step}: {reason}")]
    Installation { step: String, reason: String },

    #[error("Download failed: {url}: {reason}")]
    Download { url: String, reason: String },

    #[error("Unsupported package manager: {0}")]
    UnsupportedManager(String),

    #[error("Could not determine the current user's home directory")]
    MissingHome,

    // Fingerprint errors
    #[error("Invalid glob pattern '{pattern}': {reason}")]
    PatternInvalid { pattern: String, reason: String },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    // Process errors
    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command execution error: {command}, stderr: {stderr}")]
    CommandExecution { command: String, stderr: String },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DepstashError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Create a command execution error
    pub fn command_exec(command: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self::CommandExecution {
            command: command.into(),
            stderr: stderr.into(),
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::ToolNotFound { .. } => Some("Run: depstash setup"),
            Self::CacheDirectoryResolution { .. } => {
                Some("Check that the package manager works: pip cache dir")
            }
            Self::MissingHome => Some("Set the HOME environment variable"),
            Self::UnsupportedManager(_) => Some("Supported package managers: pip"),
            _ => None,
        }
    }
}
