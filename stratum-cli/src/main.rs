//! Stratum CLI - Main entry point.

use clap::Parser;

use stratum_cli::cli::Cli;
use stratum_cli::commands;
use stratum_cli::error::CliResult;
use stratum_cli::output;

#[tokio::main]
async fn main() {
    // Load a .env file when present; ignore its absence.
    let _ = dotenvy::dotenv();
    init_tracing();

    if let Err(err) = run().await {
        output::error(&err.to_string());
        std::process::exit(1);
    }
}

async fn run() -> CliResult<()> {
    let cli = Cli::parse();
    register_drivers()?;
    commands::run(cli).await
}

fn register_drivers() -> CliResult<()> {
    stratum_postgres::register()?;
    stratum_mysql::register()?;
    stratum_sqlite::register()?;
    Ok(())
}

/// Engine progress lines (`Applying: …`, `Rows affected: …`) are plain
/// messages; strip the timestamp/level/target decorations so they read like
/// ordinary output.
fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(false)
        .without_time()
        .init();
}
