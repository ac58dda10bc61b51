//! Configuration management for depstash

pub mod schema;

pub use schema::Config;

use crate::error::{DepstashError, DepstashResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Name of the per-project config overlay
pub const LOCAL_CONFIG_NAME: &str = ".depstash.toml";

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("depstash")
            .join("config.toml")
    }

    /// Walk up from `start` looking for a `.depstash.toml`
    pub fn find_local_config(start: &Path) -> Option<PathBuf> {
        let mut dir = Some(start);
        while let Some(current) = dir {
            let candidate = current.join(LOCAL_CONFIG_NAME);
            if candidate.is_file() {
                return Some(candidate);
            }
            dir = current.parent();
        }
        None
    }

    /// Load configuration, using defaults if not present
    pub async fn load(&self) -> DepstashResult<Config> {
        if !self.config_path.exists() {
            debug!("Config file not found, using defaults");
            return Ok(Config::default());
        }

        self.load_from_file(&self.config_path).await
    }

    /// Load configuration from a specific file
    pub async fn load_from_file(&self, path: &Path) -> DepstashResult<Config> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| DepstashError::io(format!("reading config from {}", path.display()), e))?;

        toml::from_str(&content).map_err(|e| DepstashError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Load the global config with an optional local overlay merged on top
    ///
    /// Local values win per table key.
    pub async fn load_merged(&self, local: Option<&Path>) -> DepstashResult<Config> {
        let Some(local_path) = local else {
            return self.load().await;
        };

        let global_content = if self.config_path.exists() {
            fs::read_to_string(&self.config_path).await.map_err(|e| {
                DepstashError::io(format!("reading config from {}", self.config_path.display()), e)
            })?
        } else {
            String::new()
        };
        let local_content = fs::read_to_string(local_path).await.map_err(|e| {
            DepstashError::io(format!("reading config from {}", local_path.display()), e)
        })?;

        let mut merged: toml::Value = toml::from_str(&global_content)
            .map_err(|e| DepstashError::ConfigInvalid {
                path: self.config_path.clone(),
                reason: e.to_string(),
            })?;
        let overlay: toml::Value =
            toml::from_str(&local_content).map_err(|e| DepstashError::ConfigInvalid {
                path: local_path.to_path_buf(),
                reason: e.to_string(),
            })?;

        merge_values(&mut merged, overlay);

        merged
            .try_into()
            .map_err(|e: toml::de::Error| DepstashError::ConfigInvalid {
                path: local_path.to_path_buf(),
                reason: e.to_string(),
            })
    }

    /// Save configuration to file
    pub async fn save(&self, config: &Config) -> DepstashResult<()> {
        self.ensure_config_dir().await?;

        let content = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, content).await.map_err(|e| {
            DepstashError::io(
                format!("writing config to {}", self.config_path.display()),
                e,
            )
        })?;

        info!("Configuration saved to {}", self.config_path.display());
        Ok(())
    }

    /// Ensure the config directory exists
    async fn ensure_config_dir(&self) -> DepstashResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| DepstashError::ConfigDirCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }
        Ok(())
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Recursive table merge, overlay wins on leaves
fn merge_values(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, value) in overlay_table {
                match base_table.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base_table.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}
