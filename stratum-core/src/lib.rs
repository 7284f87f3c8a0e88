//! # stratum-core
//!
//! The stratum migration engine: discovers versioned SQL migration files,
//! reconciles them with a ledger table inside the target database, and
//! applies or reverses them atomically.
//!
//! This crate is database-agnostic. Backends implement the [`Driver`] and
//! [`Connection`] traits and register a factory per URL scheme with
//! [`register_driver`]; the bundled `stratum-postgres`, `stratum-mysql`, and
//! `stratum-sqlite` crates do exactly that.
//!
//! ## Example
//!
//! ```rust,ignore
//! use stratum_core::{Engine, EngineConfig};
//! use url::Url;
//!
//! #[tokio::main]
//! async fn main() -> stratum_core::Result<()> {
//!     stratum_postgres::register()?;
//!
//!     let url = Url::parse("postgres://localhost:5432/myapp")?;
//!     let engine = Engine::new(EngineConfig::new(url).verbose(true));
//!
//!     engine.create_and_migrate().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Migration files
//!
//! Migrations are single `.sql` files named `<version>_<description>.sql`,
//! where `<version>` is the leading digit run. Each file holds an `up`
//! section and an optional `down` section separated by directive comments:
//!
//! ```sql
//! -- migrate:up
//! create table users (id serial primary key, name text);
//!
//! -- migrate:down
//! drop table users;
//! ```
//!
//! A directive may carry options; the only recognized one is
//! `transaction:true|false` (default `true`).

pub mod driver;
pub mod engine;
pub mod error;
mod executor;
mod finder;
pub mod fs;
pub mod migration;
pub mod position;
mod reconcile;
pub mod registry;

pub use driver::{Connection, Driver, DriverConfig};
pub use engine::{Engine, EngineConfig, MigrationStatus, MIGRATION_TEMPLATE};
pub use error::{Error, Result};
pub use fs::{FileSystem, HostFileSystem, MemoryFileSystem};
pub use migration::{Migration, MigrationOptions, MigrationSection, ParsedMigration};
pub use position::{locate, SourcePosition};
pub use registry::{register_driver, registered_schemes, resolve_driver, DriverFactory};
