//! Toolchain probing and repair
//!
//! A cache-dir query against a half-installed toolchain hangs or lies, so
//! resolution runs this state machine first. Repair policy: probe,
//! install, re-probe, fail if the tool is still absent - one repair
//! cycle, no further retries. Installs mutate global toolchain state in
//! place and are not rolled back on failure; the re-probe surfaces it.

use crate::error::{DepstashError, DepstashResult};
use crate::platform::Platform;
use crate::process::CommandRunner;
use async_trait::async_trait;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

const GET_PIP_URL: &str = "https://bootstrap.pypa.io/get-pip.py";

/// Repair progress for one package manager's toolchain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolchainState {
    /// Manager presence unknown, probe pending
    ToolAbsent,
    /// Manager absent, checking/installing the interpreter
    InterpreterRepairing,
    /// Interpreter present, bootstrapping the manager
    ManagerRepairing,
    /// Manager answers its version probe
    Ready,
}

/// Probe/install operations the state machine drives
///
/// Separated from the machine itself so the retry/install logic is
/// testable with scripted fakes, independent of the OS facts that select
/// the initial branch.
#[async_trait]
pub trait ToolchainOps: Send + Sync {
    /// Package-manager name, for diagnostics
    fn manager(&self) -> &str;

    /// Interpreter executable, for diagnostics
    fn interpreter(&self) -> String;

    /// Does the package manager answer a version probe?
    async fn probe_manager(&self) -> bool;

    /// Does the interpreter answer a version probe?
    async fn probe_interpreter(&self) -> bool;

    /// Install the interpreter
    async fn install_interpreter(&self) -> DepstashResult<()>;

    /// Bootstrap the package manager via the interpreter
    async fn bootstrap_manager(&self) -> DepstashResult<()>;
}

/// Drive the toolchain to [`ToolchainState::Ready`]
///
/// Returns the visited states, ending in `Ready`. The interpreter probe
/// always completes before the manager bootstrap; each step's success is
/// a precondition for the next's correctness.
pub async fn ensure_ready(ops: &dyn ToolchainOps) -> DepstashResult<Vec<ToolchainState>> {
    let mut state = ToolchainState::ToolAbsent;
    let mut visited = vec![state];

    loop {
        state = match state {
            ToolchainState::ToolAbsent => {
                if ops.probe_manager().await {
                    debug!("{} present", ops.manager());
                    ToolchainState::Ready
                } else {
                    info!("{} not found, repairing toolchain", ops.manager());
                    ToolchainState::InterpreterRepairing
                }
            }
            ToolchainState::InterpreterRepairing => {
                if !ops.probe_interpreter().await {
                    info!("{} not found, installing", ops.interpreter());
                    ops.install_interpreter().await?;
                    if !ops.probe_interpreter().await {
                        return Err(DepstashError::ToolNotFound {
                            name: ops.interpreter(),
                            hint: "Interpreter still absent after installation".to_string(),
                        });
                    }
                }
                ToolchainState::ManagerRepairing
            }
            ToolchainState::ManagerRepairing => {
                info!("bootstrapping {}", ops.manager());
                ops.bootstrap_manager().await?;
                if !ops.probe_manager().await {
                    return Err(DepstashError::ToolNotFound {
                        name: ops.manager().to_string(),
                        hint: format!("{} still absent after bootstrap", ops.manager()),
                    });
                }
                ToolchainState::Ready
            }
            ToolchainState::Ready => return Ok(visited),
        };
        visited.push(state);
    }
}

/// Interpreter executable for the platform
///
/// Windows resolves under `PYTHON_HOME` when the runner sets it; POSIX
/// uses the `python3` launcher.
pub fn interpreter_executable(platform: Platform) -> String {
    if platform.is_windows() {
        match env::var("PYTHON_HOME") {
            Ok(home) if !home.is_empty() => Path::new(&home)
                .join("python")
                .to_string_lossy()
                .into_owned(),
            _ => "python".to_string(),
        }
    } else {
        "python3".to_string()
    }
}

/// Pip toolchain operations over a command runner
pub struct PipToolchain {
    runner: Arc<dyn CommandRunner>,
    platform: Platform,
}

impl PipToolchain {
    pub fn new(runner: Arc<dyn CommandRunner>, platform: Platform) -> Self {
        Self { runner, platform }
    }

    async fn probe(&self, program: &str) -> bool {
        matches!(
            self.runner.run(program, &["--version"]).await,
            Ok(output) if output.success()
        )
    }

    /// Find the host's package-manager command
    async fn detect_system_package_manager(&self) -> Option<&'static str> {
        for candidate in ["dnf", "apt-get", "pacman", "zypper"] {
            if let Ok(output) = self.runner.run("which", &[candidate]).await {
                if output.success() {
                    return Some(candidate);
                }
            }
        }
        None
    }

    async fn install_step(&self, step: &str, program: &str, args: &[&str]) -> DepstashResult<()> {
        if self.runner.run_streamed(program, args).await? {
            Ok(())
        } else {
            Err(DepstashError::Installation {
                step: step.to_string(),
                reason: format!("{} {} exited non-zero", program, args.join(" ")),
            })
        }
    }

    /// Fetch get-pip.py into the temp directory
    fn fetch_get_pip(&self) -> DepstashResult<PathBuf> {
        info!("downloading {}", GET_PIP_URL);
        let mut response = ureq::get(GET_PIP_URL)
            .call()
            .map_err(|e| DepstashError::Download {
                url: GET_PIP_URL.to_string(),
                reason: e.to_string(),
            })?;
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| DepstashError::Download {
                url: GET_PIP_URL.to_string(),
                reason: e.to_string(),
            })?;

        let path = env::temp_dir().join("get-pip.py");
        std::fs::write(&path, body)
            .map_err(|e| DepstashError::io(format!("writing {}", path.display()), e))?;
        Ok(path)
    }
}

#[async_trait]
impl ToolchainOps for PipToolchain {
    fn manager(&self) -> &str {
        "pip"
    }

    fn interpreter(&self) -> String {
        interpreter_executable(self.platform)
    }

    async fn probe_manager(&self) -> bool {
        self.probe("pip").await
    }

    async fn probe_interpreter(&self) -> bool {
        self.probe(&self.interpreter()).await
    }

    async fn install_interpreter(&self) -> DepstashResult<()> {
        match self.platform {
            Platform::Linux => {
                let pm = self.detect_system_package_manager().await.ok_or_else(|| {
                    DepstashError::Installation {
                        step: "interpreter".to_string(),
                        reason: "no supported package manager found (dnf, apt-get, pacman, zypper)"
                            .to_string(),
                    }
                })?;

                match pm {
                    "apt-get" => {
                        self.install_step("package index update", "sudo", &["apt-get", "update"])
                            .await?;
                        self.install_step(
                            "interpreter",
                            "sudo",
                            &["apt-get", "install", "-y", "python3"],
                        )
                        .await
                    }
                    "pacman" => {
                        self.install_step(
                            "interpreter",
                            "sudo",
                            &["pacman", "-S", "--noconfirm", "python"],
                        )
                        .await
                    }
                    pm => {
                        self.install_step("interpreter", "sudo", &[pm, "install", "-y", "python3"])
                            .await
                    }
                }
            }
            Platform::MacOS => {
                self.install_step("interpreter", "brew", &["install", "python"])
                    .await
            }
            Platform::Windows | Platform::Unsupported => Err(DepstashError::Installation {
                step: "interpreter".to_string(),
                reason: format!(
                    "no managed interpreter install on {}; install Python and set PYTHON_HOME",
                    self.platform.name()
                ),
            }),
        }
    }

    async fn bootstrap_manager(&self) -> DepstashResult<()> {
        let python = self.interpreter();

        let ensurepip_ok = self
            .runner
            .run_streamed(&python, &["-m", "ensurepip", "--upgrade"])
            .await?;

        if !ensurepip_ok {
            // Debian-family interpreters ship without ensurepip.
            warn!("ensurepip unavailable, falling back to get-pip.py");
            let script = self.fetch_get_pip()?;
            let script_arg = script.to_string_lossy().into_owned();
            let result = self
                .install_step("get-pip.py", &python, &[script_arg.as_str()])
                .await;
            if let Err(e) = std::fs::remove_file(&script) {
                debug!("could not remove {}: {}", script.display(), e);
            }
            result?;
        }

        self.install_step(
            "pip upgrade",
            &python,
            &["-m", "pip", "install", "--upgrade", "pip"],
        )
        .await
    }
}

/// Probe the interpreter and report its version, semver-normalized
///
/// Used when no interpreter version is configured for the cache key.
/// Non-semver-shaped output (e.g. "3.13.0rc1") is kept verbatim.
pub async fn probe_interpreter_version(
    runner: &dyn CommandRunner,
    platform: Platform,
) -> DepstashResult<String> {
    let exe = interpreter_executable(platform);
    let not_found = |hint: String| DepstashError::ToolNotFound {
        name: exe.clone(),
        hint,
    };

    let output = runner
        .run(&exe, &["--version"])
        .await
        .map_err(|e| not_found(format!("Interpreter probe failed: {}", e)))?;
    if !output.success() {
        return Err(not_found(
            "Install Python or pass --python-version".to_string(),
        ));
    }

    // Older interpreters print the banner on stderr.
    let banner = if output.stdout.trim().is_empty() {
        output.stderr
    } else {
        output.stdout
    };
    let token = banner
        .split_whitespace()
        .last()
        .ok_or_else(|| not_found("Interpreter printed no version".to_string()))?;

    Ok(match semver::Version::parse(token) {
        Ok(version) => version.to_string(),
        Err(_) => token.to_string(),
    })
}
