//! Platform detection and environment facts
//!
//! Everything the cache-key compositor needs to know about the host is
//! collected here as a read-only snapshot, so key computation stays
//! deterministic and testable without touching the process environment.

use std::env;
use std::fs;

/// Detected platform family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// Linux - distro facts contribute extra cache-key segments
    Linux,
    /// macOS
    MacOS,
    /// Windows - toolchain repair runs before the cache-dir query
    Windows,
    /// Unsupported platform
    Unsupported,
}

impl Platform {
    /// Detect the current platform
    pub fn detect() -> Self {
        match env::consts::OS {
            "linux" => Platform::Linux,
            "macos" => Platform::MacOS,
            "windows" => Platform::Windows,
            _ => Platform::Unsupported,
        }
    }

    /// Get a human-readable platform name
    ///
    /// Matches the labels GitHub-style runners put in `RUNNER_OS`.
    pub fn name(&self) -> &'static str {
        match self {
            Platform::Linux => "Linux",
            Platform::MacOS => "macOS",
            Platform::Windows => "Windows",
            Platform::Unsupported => "Unsupported",
        }
    }

    pub fn is_linux(&self) -> bool {
        matches!(self, Platform::Linux)
    }

    pub fn is_windows(&self) -> bool {
        matches!(self, Platform::Windows)
    }
}

/// CPU architecture as a CI runner label
///
/// Runners report "x64"/"arm64" rather than the Rust target names.
pub fn arch() -> &'static str {
    match env::consts::ARCH {
        "x86_64" => "x64",
        "aarch64" => "arm64",
        "x86" => "x86",
        other => other,
    }
}

/// The OS label the CI runner reports, falling back to the platform name
pub fn runner_os(platform: Platform) -> String {
    env::var("RUNNER_OS").unwrap_or_else(|_| platform.name().to_string())
}

/// Linux distribution facts parsed from /etc/os-release
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinuxRelease {
    /// Distribution id, e.g. "ubuntu"
    pub name: String,
    /// Distribution version, e.g. "22.04"
    pub version: String,
}

impl LinuxRelease {
    /// Read the distro facts for the current host, None off-Linux or
    /// when /etc/os-release is absent
    pub fn detect() -> Option<Self> {
        if !Platform::detect().is_linux() {
            return None;
        }
        let content = fs::read_to_string("/etc/os-release").ok()?;
        Self::parse(&content)
    }

    /// Parse `ID=` and `VERSION_ID=` out of os-release content
    pub fn parse(content: &str) -> Option<Self> {
        let mut name = None;
        let mut version = None;

        for line in content.lines() {
            if let Some(value) = line.strip_prefix("ID=") {
                name = Some(value.trim().trim_matches('"').to_string());
            } else if let Some(value) = line.strip_prefix("VERSION_ID=") {
                version = Some(value.trim().trim_matches('"').to_string());
            }
        }

        Some(Self {
            name: name?,
            version: version?,
        })
    }
}

/// Read-only snapshot of the facts a cache key is derived from
#[derive(Debug, Clone)]
pub struct EnvironmentFacts {
    /// Platform family
    pub platform: Platform,
    /// CPU architecture label ("x64", "arm64")
    pub arch: String,
    /// The CI runner's reported OS label
    pub runner_os: String,
    /// Distro facts, Linux only
    pub linux_release: Option<LinuxRelease>,
    /// Configured interpreter version, e.g. "3.11.4"
    pub python_version: String,
    /// Package-manager identifier, e.g. "pip"
    pub manager: String,
}

impl EnvironmentFacts {
    /// Assemble the snapshot from the process environment
    pub fn detect(python_version: impl Into<String>, manager: impl Into<String>) -> Self {
        let platform = Platform::detect();
        Self {
            platform,
            arch: arch().to_string(),
            runner_os: runner_os(platform),
            linux_release: LinuxRelease::detect(),
            python_version: python_version.into(),
            manager: manager.into(),
        }
    }
}
