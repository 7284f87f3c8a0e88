//! # stratum-mysql
//!
//! MySQL driver for the stratum migration engine, built on `mysql_async`.
//!
//! Migration sections are split into individual statements client-side
//! before execution, so sections with several statements work without the
//! multi-statement protocol flag. MySQL auto-commits DDL, so this driver
//! reports no transactional-DDL support and sections run unwrapped; the
//! ledger row is written once the section has succeeded.
//!
//! Schema dumps shell out to `mysqldump --no-data` and append the ledger
//! rows.

mod driver;
mod statement;

pub use driver::MysqlDriver;

use stratum_core::{Driver, DriverConfig, Result};

fn factory(config: DriverConfig) -> Result<Box<dyn Driver>> {
    Ok(Box::new(MysqlDriver::new(config)))
}

/// Register this driver for the `mysql` URL scheme.
pub fn register() -> Result<()> {
    stratum_core::register_driver("mysql", factory)
}
