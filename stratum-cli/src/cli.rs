//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Stratum - database schema migrations without the framework
#[derive(Parser, Debug)]
#[command(name = "stratum")]
#[command(version)]
#[command(about = "Database schema migrations without the framework", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Database connection URL
    #[arg(short = 'u', long, global = true, value_name = "URL", env = "DATABASE_URL")]
    pub url: Option<String>,

    /// Directory of migration files (repeat for multiple directories)
    #[arg(short = 'd', long = "migrations-dir", global = true, value_name = "DIR")]
    pub migrations_dir: Vec<PathBuf>,

    /// Name of the migrations ledger table
    #[arg(
        long,
        global = true,
        value_name = "TABLE",
        env = "STRATUM_MIGRATIONS_TABLE"
    )]
    pub migrations_table: Option<String>,

    /// Path the schema dump is written to
    #[arg(
        short = 's',
        long,
        global = true,
        value_name = "FILE",
        env = "STRATUM_SCHEMA_FILE"
    )]
    pub schema_file: Option<PathBuf>,

    /// Skip updating the schema file after migrate and rollback
    #[arg(long, global = true)]
    pub no_dump_schema: bool,

    /// Refuse pending migrations older than the newest applied one
    #[arg(long, global = true)]
    pub strict: bool,

    /// Wait for the database to become available before running the command
    #[arg(long, global = true)]
    pub wait: bool,

    /// Seconds to keep waiting before giving up
    #[arg(long, global = true, value_name = "SECONDS", default_value_t = 60)]
    pub wait_timeout: u64,

    /// Print each migration as it is applied
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate a new migration file
    New {
        /// Migration name, e.g. "create users table"
        name: String,
    },

    /// Create the database
    Create,

    /// Drop the database
    Drop,

    /// Create the database if necessary, then apply pending migrations
    Up,

    /// Apply pending migrations
    Migrate,

    /// Roll back the most recent migration
    #[command(alias = "down")]
    Rollback,

    /// List migrations and whether they are applied
    Status,

    /// Write the current schema to the schema file
    Dump,

    /// Block until the database becomes available
    Wait,
}
