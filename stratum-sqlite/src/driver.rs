//! SQLite driver implementation.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio_rusqlite::Connection as AsyncConnection;
use tracing::debug;
use url::Url;

use stratum_core::{Connection, Driver, DriverConfig, Error, Result};

/// SQLite backend.
#[derive(Debug)]
pub struct SqliteDriver {
    config: DriverConfig,
    path: PathBuf,
}

impl SqliteDriver {
    /// Create a driver from its configuration snapshot.
    pub fn new(config: DriverConfig) -> Self {
        let path = connection_path(&config.url);
        Self { config, path }
    }

    /// The database file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn connect(&self) -> Result<AsyncConnection> {
        AsyncConnection::open(self.path.clone())
            .await
            .map_err(|err| Error::connection(err.to_string()))
    }
}

#[async_trait]
impl Driver for SqliteDriver {
    async fn open(&self) -> Result<Box<dyn Connection>> {
        let conn = self.connect().await?;
        Ok(Box::new(SqliteConnection {
            conn: Some(conn),
            table: self.config.migrations_table.clone(),
        }))
    }

    async fn create_database(&self) -> Result<()> {
        if self.path.exists() {
            return Err(Error::driver(format!(
                "database already exists: {}",
                self.path.display()
            )));
        }
        debug!("creating database {}", self.path.display());
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        // Opening the connection creates the file.
        let conn = self.connect().await?;
        conn.close()
            .await
            .map_err(|err| Error::driver(err.to_string()))?;
        Ok(())
    }

    async fn drop_database(&self) -> Result<()> {
        debug!("dropping database {}", self.path.display());
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    async fn database_exists(&self) -> Result<bool> {
        Ok(self.path.exists())
    }

    async fn dump_schema(&self) -> Result<Vec<u8>> {
        let statements: Vec<String> = self
            .connect()
            .await?
            .call(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT sql FROM sqlite_master \
                     WHERE sql IS NOT NULL AND name NOT LIKE 'sqlite_%' \
                     ORDER BY name",
                )?;
                let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
                let mut statements = Vec::new();
                for row in rows {
                    statements.push(row?);
                }
                Ok(statements)
            })
            .await
            .map_err(sql_error)?;

        let mut dump = String::new();
        for statement in statements {
            dump.push_str(&statement);
            dump.push_str(";\n");
        }

        let mut conn = self.open().await?;
        if conn.migrations_table_exists().await? {
            let versions = conn.applied_migrations(None).await?;
            dump.push_str(&migration_inserts(&self.config.migrations_table, &versions));
        }
        conn.close().await?;
        Ok(dump.into_bytes())
    }

    fn supports_transactional_ddl(&self) -> bool {
        true
    }
}

struct SqliteConnection {
    conn: Option<AsyncConnection>,
    table: String,
}

impl SqliteConnection {
    fn conn(&self) -> Result<&AsyncConnection> {
        self.conn
            .as_ref()
            .ok_or_else(|| Error::driver("connection is closed"))
    }

    async fn batch(&self, sql: String) -> Result<u64> {
        self.conn()?
            .call(move |conn| {
                conn.execute_batch(&sql)?;
                Ok(conn.changes())
            })
            .await
            .map_err(sql_error)
    }
}

#[async_trait]
impl Connection for SqliteConnection {
    async fn execute(&mut self, sql: &str) -> Result<u64> {
        debug!(sql = %sql, "executing batch");
        self.batch(sql.to_string()).await
    }

    async fn begin(&mut self) -> Result<()> {
        self.batch("BEGIN".to_string()).await.map(|_| ())
    }

    async fn commit(&mut self) -> Result<()> {
        self.batch("COMMIT".to_string()).await.map(|_| ())
    }

    async fn rollback(&mut self) -> Result<()> {
        self.batch("ROLLBACK".to_string()).await.map(|_| ())
    }

    async fn migrations_table_exists(&mut self) -> Result<bool> {
        let table = self.table.clone();
        self.conn()?
            .call(move |conn| {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
                    [table],
                    |row| row.get(0),
                )?;
                Ok(count > 0)
            })
            .await
            .map_err(sql_error)
    }

    async fn create_migrations_table(&mut self) -> Result<()> {
        self.batch(format!(
            "CREATE TABLE IF NOT EXISTS {} (version text PRIMARY KEY)",
            quote_identifier(&self.table)
        ))
        .await
        .map(|_| ())
    }

    async fn applied_migrations(&mut self, limit: Option<usize>) -> Result<Vec<String>> {
        let table = quote_identifier(&self.table);
        let sql = match limit {
            Some(n) => format!("SELECT version FROM {table} ORDER BY version DESC LIMIT {n}"),
            None => format!("SELECT version FROM {table} ORDER BY version ASC"),
        };
        self.conn()?
            .call(move |conn| {
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
                let mut versions = Vec::new();
                for row in rows {
                    versions.push(row?);
                }
                Ok(versions)
            })
            .await
            .map_err(sql_error)
    }

    async fn insert_migration(&mut self, version: &str) -> Result<()> {
        let sql = format!(
            "INSERT INTO {} (version) VALUES (?1)",
            quote_identifier(&self.table)
        );
        let version = version.to_string();
        self.conn()?
            .call(move |conn| {
                conn.execute(&sql, [version])?;
                Ok(())
            })
            .await
            .map_err(sql_error)
    }

    async fn delete_migration(&mut self, version: &str) -> Result<()> {
        let sql = format!(
            "DELETE FROM {} WHERE version = ?1",
            quote_identifier(&self.table)
        );
        let version = version.to_string();
        self.conn()?
            .call(move |conn| {
                conn.execute(&sql, [version])?;
                Ok(())
            })
            .await
            .map_err(sql_error)
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(conn) = self.conn.take() {
            conn.close()
                .await
                .map_err(|err| Error::driver(err.to_string()))?;
        }
        Ok(())
    }
}

/// Resolve the database file path from a URL. `sqlite:name.db` and
/// `sqlite://name.db` are relative; `sqlite:/name.db` and
/// `sqlite:///name.db` are absolute.
fn connection_path(url: &Url) -> PathBuf {
    let raw = url.as_str();
    let rest = &raw[url.scheme().len() + 1..];
    let rest = rest.strip_prefix("//").unwrap_or(rest);
    let rest = rest.split('?').next().unwrap_or(rest);
    PathBuf::from(rest)
}

/// Map a driver-level error onto the contract. SQLite reports syntax error
/// offsets in bytes; they are converted to the 1-based character offsets the
/// engine expects.
fn sql_error(err: tokio_rusqlite::Error) -> Error {
    match err {
        tokio_rusqlite::Error::Rusqlite(inner) => rusqlite_error(inner),
        other => Error::driver(other.to_string()),
    }
}

fn rusqlite_error(err: rusqlite::Error) -> Error {
    match err {
        rusqlite::Error::SqlInputError {
            msg, sql, offset, ..
        } => {
            let byte_offset = offset.max(0) as usize;
            let position = sql
                .get(..byte_offset)
                .map(|prefix| prefix.chars().count() + 1);
            Error::sql(msg, position)
        }
        rusqlite::Error::SqliteFailure(_, Some(message)) => Error::sql(message, None),
        other => Error::driver(other.to_string()),
    }
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn migration_inserts(table: &str, versions: &[String]) -> String {
    let mut block = String::from("\n-- Schema migrations\n\n");
    if versions.is_empty() {
        return block;
    }
    block.push_str(&format!(
        "INSERT INTO {} (version) VALUES\n",
        quote_identifier(table)
    ));
    let rows: Vec<String> = versions
        .iter()
        .map(|version| format!("    ('{}')", version.replace('\'', "''")))
        .collect();
    block.push_str(&rows.join(",\n"));
    block.push_str(";\n");
    block
}
