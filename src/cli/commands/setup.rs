//! Setup command - probe and repair the package-manager toolchain

use crate::cli::args::SetupArgs;
use crate::error::DepstashResult;
use crate::platform::Platform;
use crate::process::{CommandRunner, SystemRunner};
use crate::strategy::toolchain::{self, PipToolchain, ToolchainOps, ToolchainState};
use crate::ui;
use std::sync::Arc;

/// Execute the setup command
pub async fn execute(args: SetupArgs) -> DepstashResult<()> {
    if args.check {
        ui::intro("depstash Setup (check only)");
    } else {
        ui::intro("depstash Setup");
    }

    let runner: Arc<dyn CommandRunner> = Arc::new(SystemRunner::new());
    let ops = PipToolchain::new(runner, Platform::detect());

    if args.check {
        return check_only(&ops).await;
    }

    ui::section("Repairing toolchain...");
    let visited = toolchain::ensure_ready(&ops).await?;

    if visited.contains(&ToolchainState::InterpreterRepairing) {
        ui::step_ok("Toolchain repaired");
    } else {
        ui::step_ok("pip already present");
    }

    ui::outro_success("Toolchain ready. Run 'depstash keys' to compute cache keys.");
    Ok(())
}

async fn check_only(ops: &PipToolchain) -> DepstashResult<()> {
    ui::section("Checking toolchain...");

    let mut issues = 0;

    if ops.probe_interpreter().await {
        ui::step_ok_detail("Python", &ops.interpreter());
    } else {
        ui::step_error("Python not found");
        issues += 1;
    }

    if ops.probe_manager().await {
        ui::step_ok("pip");
    } else {
        ui::step_warn_hint("pip not found", "bootstrapped via ensurepip on setup");
        issues += 1;
    }

    if issues > 0 {
        ui::outro_warn(&format!(
            "{} issue(s) found. Run 'depstash setup' to install.",
            issues
        ));
    } else {
        ui::outro_success("Toolchain ready.");
    }

    Ok(())
}
