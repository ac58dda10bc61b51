//! Dirs command - resolve the package manager's cache directories

use crate::cli::args::{DirsArgs, OutputFormat};
use crate::config::Config;
use crate::error::DepstashResult;
use crate::platform::EnvironmentFacts;
use crate::process::{CommandRunner, SystemRunner};
use crate::strategy::create_strategy;
use std::sync::Arc;

/// Execute the dirs command
pub async fn execute(args: DirsArgs, config: &Config) -> DepstashResult<()> {
    let runner: Arc<dyn CommandRunner> = Arc::new(SystemRunner::new());
    // The interpreter version only matters for key computation.
    let facts = EnvironmentFacts::detect(
        config.python.version.clone().unwrap_or_default(),
        config.cache.manager.clone(),
    );

    let strategy = create_strategy(
        facts,
        config.cache.dependency_glob.clone(),
        super::working_dir(config, None)?,
        runner,
    )?;

    let directories = strategy.resolve_cache_directories().await?;
    let rendered: Vec<String> = directories
        .iter()
        .map(|d| d.display().to_string())
        .collect();

    match args.format {
        OutputFormat::Plain => {
            for dir in &rendered {
                println!("{}", dir);
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rendered)?),
        OutputFormat::Github => println!("cache-paths={}", rendered.join(",")),
    }

    Ok(())
}
