//! # stratum-postgres
//!
//! PostgreSQL driver for the stratum migration engine, built on
//! `tokio-postgres`.
//!
//! Migration sections are submitted over the simple query protocol, so a
//! section can hold any number of statements and server-side error positions
//! map directly onto the submitted text. Schema dumps shell out to
//! `pg_dump --schema-only` and append the ledger rows.
//!
//! ## Example
//!
//! ```rust,ignore
//! stratum_postgres::register()?;
//!
//! let engine = stratum_core::Engine::from_url(
//!     url::Url::parse("postgres://postgres@localhost:5432/myapp")?,
//! );
//! engine.migrate().await?;
//! ```

mod driver;

pub use driver::PostgresDriver;

use stratum_core::{Driver, DriverConfig, Result};

fn factory(config: DriverConfig) -> Result<Box<dyn Driver>> {
    Ok(Box::new(PostgresDriver::new(config)))
}

/// Register this driver for the `postgres` and `postgresql` URL schemes.
pub fn register() -> Result<()> {
    stratum_core::register_driver("postgres", factory)?;
    stratum_core::register_driver("postgresql", factory)
}
