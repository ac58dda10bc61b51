//! Pip cache strategy
//!
//! Locates pip's global cache directory (repairing the toolchain when it
//! is half-installed) and derives the cache key bundle from environment
//! facts plus a fingerprint of the requirements files.

use crate::error::{DepstashError, DepstashResult};
use crate::fingerprint;
use crate::platform::EnvironmentFacts;
use crate::process::{CommandOutput, CommandRunner};
use crate::strategy::toolchain::{self, PipToolchain};
use crate::strategy::{restore_prefix, CacheKeyBundle, CacheStrategy, DEPENDENCY_BACKUP_GLOB};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

/// Cache strategy for the pip package manager
pub struct PipCache {
    facts: EnvironmentFacts,
    dependency_glob: String,
    working_dir: PathBuf,
    runner: Arc<dyn CommandRunner>,
}

impl PipCache {
    pub fn new(
        facts: EnvironmentFacts,
        dependency_glob: String,
        working_dir: PathBuf,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        Self {
            facts,
            dependency_glob,
            working_dir,
            runner,
        }
    }

    async fn ensure_toolchain(&self) -> DepstashResult<()> {
        let ops = PipToolchain::new(self.runner.clone(), self.facts.platform);
        toolchain::ensure_ready(&ops).await?;
        Ok(())
    }

    /// Run `pip cache dir` and return the trimmed stdout
    ///
    /// A non-zero exit with empty stderr is tolerated: some pip versions
    /// exit non-zero but still print a usable path.
    fn accept_query_output(&self, output: CommandOutput) -> DepstashResult<String> {
        if !output.success() && !output.stderr.trim().is_empty() {
            return Err(DepstashError::CacheDirectoryResolution {
                manager: self.facts.manager.clone(),
                stderr: output.stderr.trim().to_string(),
            });
        }
        Ok(output.stdout.trim().to_string())
    }

    async fn query_cache_dir(&self) -> DepstashResult<String> {
        let output = if self.facts.platform.is_windows() {
            // The async spawn path can hang against a toolchain that was
            // just repaired; query synchronously.
            self.runner.run_blocking("pip", &["cache", "dir"])?
        } else {
            self.runner.run("pip", &["cache", "dir"]).await?
        };
        self.accept_query_output(output)
    }

    async fn manager_answers_probe(&self) -> bool {
        matches!(
            self.runner.run("pip", &["--version"]).await,
            Ok(output) if output.success()
        )
    }
}

/// Expand a leading `~` against the current user's home directory
fn expand_home(path: &str) -> DepstashResult<PathBuf> {
    match path.strip_prefix('~') {
        Some(rest) => {
            let home = dirs::home_dir().ok_or(DepstashError::MissingHome)?;
            let rest = rest.trim_start_matches(['/', '\\']);
            if rest.is_empty() {
                Ok(home)
            } else {
                Ok(home.join(rest))
            }
        }
        None => Ok(PathBuf::from(path)),
    }
}

#[async_trait]
impl CacheStrategy for PipCache {
    fn package_manager(&self) -> &str {
        &self.facts.manager
    }

    fn dependency_glob(&self) -> &str {
        &self.dependency_glob
    }

    async fn resolve_cache_directories(&self) -> DepstashResult<Vec<PathBuf>> {
        if self.facts.platform.is_windows() {
            // Repair must complete before the query; see query_cache_dir.
            self.ensure_toolchain().await?;
        } else if !self.manager_answers_probe().await {
            self.ensure_toolchain().await?;
        }

        let raw = self.query_cache_dir().await?;
        let dir = expand_home(&raw)?;
        debug!("global cache directory path is {}", dir.display());

        Ok(vec![dir])
    }

    async fn compute_cache_keys(&self) -> DepstashResult<CacheKeyBundle> {
        let fingerprint = fingerprint::dependency_fingerprint(
            &self.working_dir,
            &self.dependency_glob,
            DEPENDENCY_BACKUP_GLOB,
        )?;

        if fingerprint.is_none() {
            warn!(
                "no dependency files matched {} or {}; cache key will not be content-addressed",
                self.dependency_glob, DEPENDENCY_BACKUP_GLOB
            );
        }

        let prefix = restore_prefix(&self.facts);
        let primary_key = format!("{}-{}", prefix, fingerprint.unwrap_or_default());

        Ok(CacheKeyBundle {
            primary_key,
            restore_keys: vec![prefix],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{LinuxRelease, Platform};
    use crate::strategy::DEFAULT_DEPENDENCY_GLOB;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    fn out(stdout: &str, stderr: &str, exit_code: i32) -> CommandOutput {
        CommandOutput {
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
            exit_code,
        }
    }

    /// Runner replaying scripted outputs, recording commands in order
    struct ScriptedRunner {
        script: Mutex<VecDeque<CommandOutput>>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedRunner {
        fn new(script: Vec<CommandOutput>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn next(&self, label: String) -> CommandOutput {
            self.calls.lock().unwrap().push(label);
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| out("", "", 127))
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CommandRunner for ScriptedRunner {
        async fn run(&self, program: &str, args: &[&str]) -> DepstashResult<CommandOutput> {
            Ok(self.next(format!("{} {}", program, args.join(" "))))
        }

        fn run_blocking(&self, program: &str, args: &[&str]) -> DepstashResult<CommandOutput> {
            Ok(self.next(format!("[blocking] {} {}", program, args.join(" "))))
        }

        async fn run_streamed(&self, program: &str, args: &[&str]) -> DepstashResult<bool> {
            Ok(self
                .next(format!("{} {}", program, args.join(" ")))
                .success())
        }
    }

    fn linux_facts() -> EnvironmentFacts {
        EnvironmentFacts {
            platform: Platform::Linux,
            arch: "x64".to_string(),
            runner_os: "Linux".to_string(),
            linux_release: Some(LinuxRelease {
                name: "ubuntu".to_string(),
                version: "22.04".to_string(),
            }),
            python_version: "3.11.4".to_string(),
            manager: "pip".to_string(),
        }
    }

    fn pip_cache(facts: EnvironmentFacts, dir: &TempDir, runner: ScriptedRunner) -> PipCache {
        PipCache::new(
            facts,
            DEFAULT_DEPENDENCY_GLOB.to_string(),
            dir.path().to_path_buf(),
            Arc::new(runner),
        )
    }

    #[tokio::test]
    async fn keys_match_documented_linux_layout() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("requirements.txt"), "requests==2.31.0\n").unwrap();
        let strategy = pip_cache(linux_facts(), &dir, ScriptedRunner::new(vec![]));

        let bundle = strategy.compute_cache_keys().await.unwrap();

        let prefix = "depstash-Linux-x64-22.04-ubuntu-python-3.11.4-pip";
        assert_eq!(bundle.restore_keys, vec![prefix.to_string()]);
        assert!(bundle.primary_key.starts_with(&format!("{}-", prefix)));
        assert_eq!(bundle.primary_key.len(), prefix.len() + 1 + 64);
    }

    #[tokio::test]
    async fn keys_are_reproducible() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("requirements.txt"), "requests\n").unwrap();
        let strategy = pip_cache(linux_facts(), &dir, ScriptedRunner::new(vec![]));

        let first = strategy.compute_cache_keys().await.unwrap();
        let second = strategy.compute_cache_keys().await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn dependency_edit_changes_primary_only() {
        let dir = TempDir::new().unwrap();
        let req = dir.path().join("requirements.txt");
        fs::write(&req, "requests==2.31.0\n").unwrap();
        let strategy = pip_cache(linux_facts(), &dir, ScriptedRunner::new(vec![]));

        let before = strategy.compute_cache_keys().await.unwrap();
        fs::write(&req, "requests==2.31.1\n").unwrap();
        let after = strategy.compute_cache_keys().await.unwrap();

        assert_ne!(before.primary_key, after.primary_key);
        assert_eq!(before.restore_keys, after.restore_keys);
    }

    #[tokio::test]
    async fn restore_key_strictly_prefixes_primary() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("requirements.txt"), "flask\n").unwrap();
        let strategy = pip_cache(linux_facts(), &dir, ScriptedRunner::new(vec![]));

        let bundle = strategy.compute_cache_keys().await.unwrap();
        let restore = &bundle.restore_keys[0];

        assert!(bundle.primary_key.starts_with(restore.as_str()));
        assert!(bundle.primary_key.len() > restore.len());
        assert_eq!(bundle.primary_key.as_bytes()[restore.len()], b'-');
    }

    #[tokio::test]
    async fn missing_dependency_files_degrade_to_empty_segment() {
        let dir = TempDir::new().unwrap();
        let strategy = pip_cache(linux_facts(), &dir, ScriptedRunner::new(vec![]));

        let bundle = strategy.compute_cache_keys().await.unwrap();
        assert_eq!(
            bundle.primary_key,
            format!("{}-", bundle.restore_keys[0])
        );
    }

    #[tokio::test]
    async fn backup_pattern_feeds_fingerprint() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("pyproject.toml"), "[project]\n").unwrap();
        let strategy = pip_cache(linux_facts(), &dir, ScriptedRunner::new(vec![]));

        let bundle = strategy.compute_cache_keys().await.unwrap();
        let expected = fingerprint::hash_matching_files(dir.path(), &["**/pyproject.toml"])
            .unwrap()
            .unwrap();
        assert!(bundle.primary_key.ends_with(&expected));
    }

    #[tokio::test]
    async fn resolve_probes_then_queries() {
        let dir = TempDir::new().unwrap();
        let runner = ScriptedRunner::new(vec![
            out("pip 24.0 from ...", "", 0),           // pip --version probe
            out("/home/runner/.cache/pip\n", "", 0),   // pip cache dir
        ]);
        let strategy = pip_cache(linux_facts(), &dir, runner);

        let dirs = strategy.resolve_cache_directories().await.unwrap();
        assert_eq!(dirs, vec![PathBuf::from("/home/runner/.cache/pip")]);
    }

    #[tokio::test]
    async fn healthy_probe_skips_installer_steps() {
        let dir = TempDir::new().unwrap();
        let runner = Arc::new(ScriptedRunner::new(vec![
            out("pip 24.0", "", 0),
            out("/tmp/pip-cache\n", "", 0),
        ]));
        let strategy = PipCache::new(
            linux_facts(),
            DEFAULT_DEPENDENCY_GLOB.to_string(),
            dir.path().to_path_buf(),
            runner.clone(),
        );

        strategy.resolve_cache_directories().await.unwrap();

        assert_eq!(runner.calls(), vec!["pip --version", "pip cache dir"]);
    }

    #[tokio::test]
    async fn failed_probe_repairs_then_queries_once() {
        let dir = TempDir::new().unwrap();
        let runner = Arc::new(ScriptedRunner::new(vec![
            out("", "pip: command not found", 127), // lightweight probe
            out("", "", 127),                       // state machine: pip probe
            out("Python 3.11.4", "", 0),            // python3 probe
            out("", "", 0),                         // ensurepip
            out("", "", 0),                         // pip upgrade
            out("pip 24.0", "", 0),                 // re-probe after bootstrap
            out("~/.cache/pip\n", "", 0),           // pip cache dir
        ]));
        let strategy = PipCache::new(
            linux_facts(),
            DEFAULT_DEPENDENCY_GLOB.to_string(),
            dir.path().to_path_buf(),
            runner.clone(),
        );

        let dirs = strategy.resolve_cache_directories().await.unwrap();

        let home = dirs::home_dir().unwrap();
        assert_eq!(dirs, vec![home.join(".cache/pip")]);

        let calls = runner.calls();
        let queries: Vec<_> = calls.iter().filter(|c| *c == "pip cache dir").collect();
        assert_eq!(queries.len(), 1);
        assert_eq!(calls.last().unwrap(), "pip cache dir");
    }

    #[tokio::test]
    async fn windows_repairs_then_queries_synchronously() {
        let dir = TempDir::new().unwrap();
        let facts = EnvironmentFacts {
            platform: Platform::Windows,
            runner_os: "Windows".to_string(),
            linux_release: None,
            ..linux_facts()
        };
        let runner = Arc::new(ScriptedRunner::new(vec![
            out("pip 24.0", "", 0),                        // state machine probe
            out("C:\\Users\\runner\\pip\\cache\n", "", 0), // blocking query
        ]));
        let strategy = PipCache::new(
            facts,
            DEFAULT_DEPENDENCY_GLOB.to_string(),
            dir.path().to_path_buf(),
            runner.clone(),
        );

        let dirs = strategy.resolve_cache_directories().await.unwrap();

        assert_eq!(dirs, vec![PathBuf::from("C:\\Users\\runner\\pip\\cache")]);
        assert_eq!(
            runner.calls(),
            vec!["pip --version", "[blocking] pip cache dir"]
        );
    }

    #[tokio::test]
    async fn query_failure_with_diagnostics_is_fatal() {
        let dir = TempDir::new().unwrap();
        let runner = ScriptedRunner::new(vec![
            out("pip 24.0", "", 0),
            out("", "ERROR: unknown command \"cache\"", 1),
        ]);
        let strategy = pip_cache(linux_facts(), &dir, runner);

        let err = strategy.resolve_cache_directories().await.unwrap_err();
        assert!(matches!(
            err,
            DepstashError::CacheDirectoryResolution { manager, .. } if manager == "pip"
        ));
    }

    #[tokio::test]
    async fn nonzero_exit_without_diagnostics_is_tolerated() {
        let dir = TempDir::new().unwrap();
        let runner = ScriptedRunner::new(vec![
            out("pip 24.0", "", 0),
            out("/var/cache/pip\n", "", 1),
        ]);
        let strategy = pip_cache(linux_facts(), &dir, runner);

        let dirs = strategy.resolve_cache_directories().await.unwrap();
        assert_eq!(dirs, vec![PathBuf::from("/var/cache/pip")]);
    }

    #[test]
    fn tilde_expands_to_home() {
        let home = dirs::home_dir().unwrap();
        assert_eq!(expand_home("~/cache").unwrap(), home.join("cache"));
        assert_eq!(expand_home("~").unwrap(), home);
        assert_eq!(
            expand_home("/opt/pip-cache").unwrap(),
            PathBuf::from("/opt/pip-cache")
        );
    }
}
