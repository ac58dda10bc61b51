//! Dependency fingerprinting
//!
//! Hashes the dependency-declaration files matched by a glob pattern into
//! one digest. Same declarations = same fingerprint = cache hit; the
//! whole caching layer's hit rate rides on this being reproducible
//! across machines.

use crate::error::{DepstashError, DepstashResult};
use globset::{Glob, GlobSet, GlobSetBuilder};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

fn build_globset(patterns: &[&str]) -> DepstashResult<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| DepstashError::PatternInvalid {
            pattern: (*pattern).to_string(),
            reason: e.to_string(),
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|e| DepstashError::PatternInvalid {
        pattern: patterns.join(", "),
        reason: e.to_string(),
    })
}

/// Collect files under `root` matched by the patterns, sorted by their
/// relative path
///
/// Sorting makes the combined digest independent of filesystem
/// enumeration order.
fn matching_files(root: &Path, globs: &GlobSet) -> Vec<PathBuf> {
    let mut matched: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| {
            let rel = entry.path().strip_prefix(root).ok()?;
            if globs.is_match(rel) {
                Some(rel.to_path_buf())
            } else {
                None
            }
        })
        .collect();

    matched.sort();
    matched
}

/// Hash all files under `root` matched by the patterns
///
/// Each file's bytes are hashed with SHA-256 and the per-file digests are
/// folded, in sorted relative-path order, into an outer SHA-256. Returns
/// `None` when nothing matches.
pub fn hash_matching_files(root: &Path, patterns: &[&str]) -> DepstashResult<Option<String>> {
    let globs = build_globset(patterns)?;
    let matched = matching_files(root, &globs);

    if matched.is_empty() {
        debug!("no files matched {:?} under {}", patterns, root.display());
        return Ok(None);
    }

    let mut combined = Sha256::new();
    for rel in &matched {
        let path = root.join(rel);
        let contents = fs::read(&path)
            .map_err(|e| DepstashError::io(format!("reading {}", path.display()), e))?;

        let mut hasher = Sha256::new();
        hasher.update(&contents);
        combined.update(hasher.finalize());
    }

    debug!("fingerprinted {} dependency file(s)", matched.len());
    Ok(Some(hex::encode(combined.finalize())))
}

/// Fingerprint dependency files, falling back to a backup pattern
///
/// The backup pattern is consulted only when the primary matches nothing.
pub fn dependency_fingerprint(
    root: &Path,
    primary: &str,
    backup: &str,
) -> DepstashResult<Option<String>> {
    if let Some(hash) = hash_matching_files(root, &[primary])? {
        return Ok(Some(hash));
    }
    hash_matching_files(root, &[backup])
}
