//! The driver contract: the capability set every database backend
//! implements.
//!
//! A [`Driver`] handles whole-database concerns (create, drop, dump,
//! reachability) while a [`Connection`] handles everything that runs against
//! an open session: raw SQL batches, transaction control, and the ledger
//! table CRUD. Drivers are constructed by the registry from a
//! [`DriverConfig`] snapshot, so ledger methods never need the table name
//! passed per call.

use async_trait::async_trait;
use url::Url;

use crate::error::Result;

/// Configuration handed to a driver factory.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// The full database URL, including scheme.
    pub url: Url,
    /// Name of the ledger table (default `schema_migrations`).
    pub migrations_table: String,
}

/// A database backend.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Open a connection to the target database.
    async fn open(&self) -> Result<Box<dyn Connection>>;

    /// Create the target database via an administrative connection.
    /// Creating a database that already exists is an error.
    async fn create_database(&self) -> Result<()>;

    /// Drop the target database. Dropping a database that does not exist
    /// succeeds.
    async fn drop_database(&self) -> Result<()>;

    /// Whether the target database exists.
    async fn database_exists(&self) -> Result<bool>;

    /// Produce a canonical schema dump followed by insert statements for
    /// every ledger row. The engine writes these bytes to the schema file.
    async fn dump_schema(&self) -> Result<Vec<u8>>;

    /// Whether DDL statements participate in transactions on this backend.
    /// When false, the executor skips `BEGIN`/`COMMIT` around migration
    /// sections and warns that `transaction:true` cannot be honored.
    fn supports_transactional_ddl(&self) -> bool;

    /// Check that the database accepts connections. Used by the wait loop.
    async fn ping(&self) -> Result<()> {
        let mut conn = self.open().await?;
        conn.close().await
    }
}

/// An open session against the target database.
#[async_trait]
pub trait Connection: Send {
    /// Execute a batch of SQL statements, returning the affected-row count
    /// of the last statement (0 when the backend does not report one).
    ///
    /// On failure the error is [`crate::Error::Sql`]; its `position`, when
    /// present, is a 1-based character offset into the submitted string.
    async fn execute(&mut self, sql: &str) -> Result<u64>;

    /// Begin a transaction.
    async fn begin(&mut self) -> Result<()>;

    /// Commit the current transaction.
    async fn commit(&mut self) -> Result<()>;

    /// Roll back the current transaction.
    async fn rollback(&mut self) -> Result<()>;

    /// Whether the ledger table exists.
    async fn migrations_table_exists(&mut self) -> Result<bool>;

    /// Create the ledger table if it does not exist.
    async fn create_migrations_table(&mut self) -> Result<()>;

    /// Versions currently recorded in the ledger. With a `limit`, the newest
    /// versions come first; without one, the full set is returned in
    /// ascending order.
    async fn applied_migrations(&mut self, limit: Option<usize>) -> Result<Vec<String>>;

    /// Record a version in the ledger.
    async fn insert_migration(&mut self, version: &str) -> Result<()>;

    /// Remove a version from the ledger.
    async fn delete_migration(&mut self, version: &str) -> Result<()>;

    /// Close the session.
    async fn close(&mut self) -> Result<()>;
}
