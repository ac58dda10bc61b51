//! Cache strategies
//!
//! A strategy answers two questions for one package manager: which
//! directories hold its global cache, and under which keys that content
//! should be stored and looked up. Shared plumbing (key-prefix assembly,
//! the toolchain repair machine) lives here; each manager supplies its
//! own resolver and key policy.

pub mod pip;
pub mod toolchain;

pub use pip::PipCache;

use crate::error::{DepstashError, DepstashResult};
use crate::platform::EnvironmentFacts;
use crate::process::CommandRunner;
use async_trait::async_trait;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

/// Namespace prefix every cache key starts with
pub const CACHE_KEY_PREFIX: &str = "depstash";

/// Default dependency-declaration pattern for pip projects
pub const DEFAULT_DEPENDENCY_GLOB: &str = "**/requirements.txt";

/// Backup pattern, consulted only when the primary matches nothing
pub const DEPENDENCY_BACKUP_GLOB: &str = "**/pyproject.toml";

/// Segment delimiter within a cache key
pub const KEY_DELIMITER: char = '-';

/// Primary key plus ordered fallback keys for a cache lookup
///
/// Invariant: every restore key is a strict prefix of `primary_key`, so a
/// partial match (same environment, different dependency hash) is still a
/// valid restore candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheKeyBundle {
    /// Exact-match key, ends with the dependency fingerprint
    pub primary_key: String,
    /// Less-specific keys, most specific first
    pub restore_keys: Vec<String>,
}

/// Contract every package-manager cache strategy implements
#[async_trait]
pub trait CacheStrategy: Send + Sync {
    /// Package-manager identifier ("pip")
    fn package_manager(&self) -> &str;

    /// Glob pattern selecting the dependency-declaration files
    fn dependency_glob(&self) -> &str;

    /// Ordered list of absolute directories the manager uses as its cache
    async fn resolve_cache_directories(&self) -> DepstashResult<Vec<PathBuf>>;

    /// Derive the cache key bundle for the current environment
    async fn compute_cache_keys(&self) -> DepstashResult<CacheKeyBundle>;
}

/// Ordered cache-key segment assembly
///
/// Joins segments with [`KEY_DELIMITER`]. Empty segments are the
/// caller's responsibility; the compositor never emits them except as
/// the degraded trailing fingerprint.
#[derive(Debug, Clone)]
pub struct KeyPrefix {
    segments: Vec<String>,
}

impl KeyPrefix {
    pub fn new(namespace: &str) -> Self {
        Self {
            segments: vec![namespace.to_string()],
        }
    }

    pub fn segment(mut self, segment: impl Into<String>) -> Self {
        self.segments.push(segment.into());
        self
    }

    pub fn finish(self) -> String {
        self.segments.join(&KEY_DELIMITER.to_string())
    }
}

/// Build the restore-key prefix for an environment
///
/// Segment order: namespace, runner OS label, arch, (Linux) distro
/// version then distro name, the literal interpreter family, interpreter
/// version, manager id.
pub fn restore_prefix(facts: &EnvironmentFacts) -> String {
    let mut key = KeyPrefix::new(CACHE_KEY_PREFIX)
        .segment(&facts.runner_os)
        .segment(&facts.arch);

    if let Some(release) = &facts.linux_release {
        key = key.segment(&release.version).segment(&release.name);
    }

    key.segment("python")
        .segment(&facts.python_version)
        .segment(&facts.manager)
        .finish()
}

/// Create the strategy registered for a package-manager id
pub fn create_strategy(
    facts: EnvironmentFacts,
    dependency_glob: String,
    working_dir: PathBuf,
    runner: Arc<dyn CommandRunner>,
) -> DepstashResult<Box<dyn CacheStrategy>> {
    let manager = facts.manager.clone();
    match manager.as_str() {
        "pip" => Ok(Box::new(PipCache::new(
            facts,
            dependency_glob,
            working_dir,
            runner,
        ))),
        other => Err(DepstashError::UnsupportedManager(other.to_string())),
    }
}
