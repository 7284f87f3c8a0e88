//! Command dispatch: map parsed arguments onto engine operations.

use std::time::Duration;

use url::Url;

use stratum_core::{Engine, EngineConfig};

use crate::cli::{Cli, Command};
use crate::error::CliResult;
use crate::output;

/// Run the selected command.
pub async fn run(cli: Cli) -> CliResult<()> {
    let engine = build_engine(&cli);
    match &cli.command {
        Command::New { name } => {
            let path = engine.new_migration(name).await?;
            output::success(&format!("Created migration: {}", path.display()));
        }
        Command::Create => {
            engine.create().await?;
            output::success("Database created");
        }
        Command::Drop => {
            engine.drop().await?;
            output::success("Database dropped");
        }
        Command::Up => {
            engine.create_and_migrate().await?;
            output::success("Database is up to date");
        }
        Command::Migrate => {
            engine.migrate().await?;
            output::success("Database is up to date");
        }
        Command::Rollback => {
            engine.rollback().await?;
            output::success("Rolled back most recent migration");
        }
        Command::Status => {
            let status = engine.status().await?;
            for migration in &status.migrations {
                let marker = if migration.applied { "[X]" } else { "[ ]" };
                output::list_item(&format!("{marker} {}", migration.file_name));
            }
            output::newline();
            output::kv("Applied", &status.applied.to_string());
            output::kv("Pending", &status.pending.to_string());
        }
        Command::Dump => {
            engine.dump_schema().await?;
            output::success(&format!(
                "Schema written to {}",
                engine.config().schema_file.display()
            ));
        }
        Command::Wait => {
            engine.wait().await?;
            output::success("Database is available");
        }
    }
    Ok(())
}

/// Build the engine configuration from CLI arguments. A URL that fails to
/// parse is treated the same as a missing one, so the engine reports its
/// canonical invalid-url message.
fn build_engine(cli: &Cli) -> Engine {
    let mut config = EngineConfig::default();
    config.database_url = cli
        .url
        .as_deref()
        .and_then(|raw| Url::parse(raw).ok());
    if !cli.migrations_dir.is_empty() {
        config.migrations_dir = cli.migrations_dir.clone();
    }
    if let Some(table) = &cli.migrations_table {
        config.migrations_table = table.clone();
    }
    if let Some(schema_file) = &cli.schema_file {
        config.schema_file = schema_file.clone();
    }
    config.auto_dump_schema = !cli.no_dump_schema;
    config.strict = cli.strict;
    config.wait_before = cli.wait;
    config.wait_timeout = Duration::from_secs(cli.wait_timeout);
    config.verbose = cli.verbose;
    Engine::new(config)
}
