//! Command implementations

mod config;
mod dirs;
mod keys;
mod setup;
mod status;

pub use config::execute as config;
pub use dirs::execute as dirs;
pub use keys::execute as keys;
pub use setup::execute as setup;
pub use status::execute as status;

use crate::config::Config;
use crate::error::{DepstashError, DepstashResult};
use std::path::PathBuf;

/// Directory the dependency glob is evaluated in
pub(crate) fn working_dir(config: &Config, explicit: Option<PathBuf>) -> DepstashResult<PathBuf> {
    if let Some(dir) = explicit {
        return Ok(dir);
    }
    if let Some(dir) = &config.cache.working_directory {
        return Ok(dir.clone());
    }
    std::env::current_dir().map_err(|e| DepstashError::io("getting current directory", e))
}
