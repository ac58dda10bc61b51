//! depstash - CI dependency-cache helper
//!
//! Computes deterministic cache keys from environment facts and a hash
//! of dependency-declaration files, and discovers the package manager's
//! global cache directory, repairing a half-installed toolchain on the
//! way.

pub mod cli;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod platform;
pub mod process;
pub mod strategy;
pub mod ui;

pub use error::{DepstashError, DepstashResult};
