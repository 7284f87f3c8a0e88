//! # stratum-sqlite
//!
//! SQLite driver for the stratum migration engine, built on
//! `tokio-rusqlite`.
//!
//! The "server" is a file: creating the database creates the file, dropping
//! it deletes the file, and existence is a stat. Sections execute through
//! `execute_batch`, and SQLite's byte-offset syntax errors are converted to
//! the character offsets the engine expects.
//!
//! URLs take the forms `sqlite:relative.db`, `sqlite:./relative.db`,
//! `sqlite:/absolute.db`, `sqlite://relative/path.db`, and
//! `sqlite:///absolute/path.db`. The `sqlite3` scheme is an alias.

mod driver;

pub use driver::SqliteDriver;

use stratum_core::{Driver, DriverConfig, Result};

fn factory(config: DriverConfig) -> Result<Box<dyn Driver>> {
    Ok(Box::new(SqliteDriver::new(config)))
}

/// Register this driver for the `sqlite` and `sqlite3` URL schemes.
pub fn register() -> Result<()> {
    stratum_core::register_driver("sqlite", factory)?;
    stratum_core::register_driver("sqlite3", factory)
}
