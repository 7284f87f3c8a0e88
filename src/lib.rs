//! # Stratum - Database Schema Migrations for Rust
//!
//! Stratum manages database schema changes with plain SQL files. Migrations
//! are discovered on disk (or on a supplied virtual filesystem), reconciled
//! against a ledger table inside the target database, and applied or
//! reversed atomically.
//!
//! ## Quick Start
//!
//! ### 1. Write a migration
//!
//! Migrations live in `./db/migrations` by default, one file per change,
//! named `<version>_<description>.sql`:
//!
//! ```sql
//! -- migrate:up
//! create table users (
//!   id serial primary key,
//!   email text not null unique
//! );
//!
//! -- migrate:down
//! drop table users;
//! ```
//!
//! ### 2. Run it
//!
//! ```rust,ignore
//! use stratum::{Engine, EngineConfig};
//! use url::Url;
//!
//! #[tokio::main]
//! async fn main() -> stratum::Result<()> {
//!     stratum::register_drivers()?;
//!
//!     let url = Url::parse("postgres://postgres@localhost:5432/myapp")?;
//!     let engine = Engine::new(EngineConfig::new(url).verbose(true));
//!     engine.create_and_migrate().await?;
//!     Ok(())
//! }
//! ```
//!
//! Or from the command line via the `stratum-cli` crate:
//!
//! ```bash
//! export DATABASE_URL="postgres://postgres@localhost:5432/myapp"
//! stratum new "create users"
//! stratum up
//! stratum rollback
//! stratum status
//! ```
//!
//! ## Crate Features
//!
//! | Feature    | Description                                   |
//! |------------|-----------------------------------------------|
//! | `postgres` | PostgreSQL driver via `tokio-postgres`        |
//! | `mysql`    | MySQL driver via `mysql_async`                |
//! | `sqlite`   | SQLite driver via `tokio-rusqlite`            |
//! | `full`     | All of the above                              |
//!
//! Drivers register themselves per URL scheme; custom backends implement
//! [`Driver`] and [`Connection`] and call [`register_driver`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub use stratum_core::{
    locate, register_driver, registered_schemes, resolve_driver, Connection, Driver, DriverConfig,
    DriverFactory, Engine, EngineConfig, Error, FileSystem, HostFileSystem, MemoryFileSystem,
    Migration, MigrationOptions, MigrationSection, MigrationStatus, ParsedMigration, Result,
    SourcePosition, MIGRATION_TEMPLATE,
};

/// PostgreSQL driver re-export.
#[cfg(feature = "postgres")]
pub mod postgres {
    pub use stratum_postgres::*;
}

/// MySQL driver re-export.
#[cfg(feature = "mysql")]
pub mod mysql {
    pub use stratum_mysql::*;
}

/// SQLite driver re-export.
#[cfg(feature = "sqlite")]
pub mod sqlite {
    pub use stratum_sqlite::*;
}

/// Register every driver enabled by this crate's features.
pub fn register_drivers() -> Result<()> {
    #[cfg(feature = "postgres")]
    stratum_postgres::register()?;
    #[cfg(feature = "mysql")]
    stratum_mysql::register()?;
    #[cfg(feature = "sqlite")]
    stratum_sqlite::register()?;
    Ok(())
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::{Engine, EngineConfig, Error, Migration, MigrationStatus, Result};
}
