//! Keys command - compute the cache key bundle

use crate::cli::args::{KeysArgs, OutputFormat};
use crate::config::Config;
use crate::error::DepstashResult;
use crate::platform::{EnvironmentFacts, Platform};
use crate::process::{CommandRunner, SystemRunner};
use crate::strategy::{create_strategy, toolchain};
use std::sync::Arc;
use tracing::debug;

/// Execute the keys command
pub async fn execute(args: KeysArgs, config: &Config) -> DepstashResult<()> {
    let runner: Arc<dyn CommandRunner> = Arc::new(SystemRunner::new());

    let python_version = match args.python_version.or_else(|| config.python.version.clone()) {
        Some(version) => version,
        None => {
            let probed =
                toolchain::probe_interpreter_version(runner.as_ref(), Platform::detect()).await?;
            debug!("probed interpreter version {}", probed);
            probed
        }
    };

    let dependency_glob = args
        .dependency_path
        .unwrap_or_else(|| config.cache.dependency_glob.clone());
    let project = super::working_dir(config, args.project)?;

    let facts = EnvironmentFacts::detect(python_version, config.cache.manager.clone());
    let strategy = create_strategy(facts, dependency_glob, project, runner)?;

    let bundle = strategy.compute_cache_keys().await?;

    match args.format {
        OutputFormat::Plain => {
            println!("{}", bundle.primary_key);
            for key in &bundle.restore_keys {
                println!("{}", key);
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&bundle)?),
        OutputFormat::Github => {
            println!("primary-key={}", bundle.primary_key);
            println!("restore-keys={}", bundle.restore_keys.join(","));
        }
    }

    Ok(())
}
