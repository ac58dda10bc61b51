//! Status command - check toolchain health and show key facts

use crate::config::Config;
use crate::error::DepstashResult;
use crate::platform::{arch, runner_os, EnvironmentFacts, LinuxRelease, Platform};
use crate::process::{CommandRunner, SystemRunner};
use crate::strategy::{restore_prefix, toolchain, CACHE_KEY_PREFIX};
use console::{style, Emoji};

static CHECK: Emoji<'_, '_> = Emoji("✓ ", "[OK] ");
static CROSS: Emoji<'_, '_> = Emoji("✗ ", "[FAIL] ");
static WARN: Emoji<'_, '_> = Emoji("⚠ ", "[WARN] ");

/// Execute the status command
///
/// Reports, never repairs; a broken toolchain is a warning here, not a
/// process failure.
pub async fn execute(config: &Config) -> DepstashResult<()> {
    println!("{}", style("depstash Toolchain Status").bold().cyan());
    println!();

    let runner = SystemRunner::new();
    let platform = Platform::detect();
    let mut all_ok = true;

    println!("{}", style("Environment:").bold());
    println!("  {} Platform: {}", CHECK, platform.name());
    println!("  {} Architecture: {}", CHECK, arch());
    println!("  {} Runner OS label: {}", CHECK, runner_os(platform));
    if platform.is_linux() {
        match LinuxRelease::detect() {
            Some(release) => println!(
                "  {} Distribution: {} {}",
                CHECK, release.name, release.version
            ),
            None => {
                println!(
                    "  {} {} - distro segments will be missing from keys",
                    WARN,
                    style("Could not read /etc/os-release").yellow()
                );
            }
        }
    }

    println!();
    println!("{}", style("Toolchain:").bold());

    let python_version = match toolchain::probe_interpreter_version(&runner, platform).await {
        Ok(version) => {
            println!("  {} Python: {}", CHECK, version);
            Some(version)
        }
        Err(_) => {
            println!(
                "  {} {} - Run: depstash setup",
                CROSS,
                style("Python not found").red()
            );
            all_ok = false;
            None
        }
    };

    match runner.run("pip", &["--version"]).await {
        Ok(output) if output.success() => {
            let first_line = output.stdout.lines().next().unwrap_or("unknown").trim();
            println!("  {} pip: {}", CHECK, first_line);

            match runner.run("pip", &["cache", "dir"]).await {
                Ok(query) if query.success() => {
                    println!("  {} Cache directory: {}", CHECK, query.stdout.trim());
                }
                _ => {
                    println!(
                        "  {} {}",
                        WARN,
                        style("pip cache dir did not answer").yellow()
                    );
                }
            }
        }
        _ => {
            println!(
                "  {} {} - Run: depstash setup",
                CROSS,
                style("pip not found").red()
            );
            all_ok = false;
        }
    }

    println!();
    println!("{}", style("Cache key:").bold());
    println!("  Namespace: {}", CACHE_KEY_PREFIX);
    println!("  Package manager: {}", config.cache.manager);
    println!("  Dependency glob: {}", config.cache.dependency_glob);

    let configured = config
        .python
        .version
        .clone()
        .or(python_version)
        .unwrap_or_else(|| "<unknown>".to_string());
    let facts = EnvironmentFacts::detect(configured, config.cache.manager.clone());
    println!("  Restore prefix: {}", restore_prefix(&facts));

    println!();
    if all_ok {
        println!("{}", style("All critical checks passed").green().bold());
    } else {
        println!(
            "{}",
            style("Some checks failed - see above for details")
                .yellow()
                .bold()
        );
    }

    Ok(())
}
