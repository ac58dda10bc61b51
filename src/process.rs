//! External process execution
//!
//! Probing, installing, and querying the toolchain all shell out. The
//! `CommandRunner` capability keeps that behind a seam so the resolution
//! and repair logic can be unit-tested with scripted outputs.

use crate::error::{DepstashError, DepstashResult};
use async_trait::async_trait;
use std::process::Stdio;
use tracing::debug;

/// Captured output of a finished command
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Abstract command execution interface
///
/// A non-zero exit status is NOT an error at this layer; callers decide.
/// The cache-dir query tolerates some non-zero exits, so it needs the raw
/// status alongside the captured streams.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run a command, capturing stdout/stderr
    async fn run(&self, program: &str, args: &[&str]) -> DepstashResult<CommandOutput>;

    /// Synchronous variant of [`run`](Self::run)
    ///
    /// The Windows cache-dir query must not go through the async spawn
    /// path: against a half-installed toolchain it can hang or fail
    /// silently there.
    fn run_blocking(&self, program: &str, args: &[&str]) -> DepstashResult<CommandOutput>;

    /// Run a command with inherited stdio, returning whether it succeeded
    ///
    /// Used for installer steps whose output operators need to see.
    async fn run_streamed(&self, program: &str, args: &[&str]) -> DepstashResult<bool>;
}

/// Runner backed by real host processes
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SystemRunner {
    fn default() -> Self {
        Self::new()
    }
}

fn describe(program: &str, args: &[&str]) -> String {
    if args.is_empty() {
        program.to_string()
    } else {
        format!("{} {}", program, args.join(" "))
    }
}

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, program: &str, args: &[&str]) -> DepstashResult<CommandOutput> {
        debug!("Executing: {}", describe(program, args));

        let output = tokio::process::Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| DepstashError::command_failed(describe(program, args), e))?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code().unwrap_or(-1),
        })
    }

    fn run_blocking(&self, program: &str, args: &[&str]) -> DepstashResult<CommandOutput> {
        debug!("Executing (blocking): {}", describe(program, args));

        let output = std::process::Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| DepstashError::command_failed(describe(program, args), e))?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code().unwrap_or(-1),
        })
    }

    async fn run_streamed(&self, program: &str, args: &[&str]) -> DepstashResult<bool> {
        debug!("Executing (streamed): {}", describe(program, args));

        let status = tokio::process::Command::new(program)
            .args(args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| DepstashError::command_failed(describe(program, args), e))?;

        Ok(status.success())
    }
}
