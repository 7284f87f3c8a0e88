//! The engine facade: configuration plus the public operations.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};
use url::Url;

use crate::driver::{Connection, Driver};
use crate::error::{Error, Result};
use crate::executor::{run_section, SectionKind};
use crate::finder::{compare_versions, find_migration_files};
use crate::fs::{FileSystem, HostFileSystem};
use crate::migration::Migration;
use crate::reconcile;
use crate::registry::resolve_driver;

/// Contents written by [`Engine::new_migration`].
pub const MIGRATION_TEMPLATE: &str = "-- migrate:up\n\n\n-- migrate:down\n\n";

/// Engine configuration. Mutable until handed to an [`Engine`]; each
/// operation reads a snapshot at entry.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// The database to operate on. Operations fail with an invalid-url
    /// error when unset.
    pub database_url: Option<Url>,
    /// Ordered migration directory roots.
    pub migrations_dir: Vec<PathBuf>,
    /// Name of the ledger table.
    pub migrations_table: String,
    /// Where schema dumps are written.
    pub schema_file: PathBuf,
    /// Dump the schema after successful migrate/rollback.
    pub auto_dump_schema: bool,
    /// Reject pending migrations older than the newest applied one.
    pub strict: bool,
    /// Wait for connectivity at the entry of every operation.
    pub wait_before: bool,
    /// Poll interval for the wait loop.
    pub wait_interval: Duration,
    /// Give-up deadline for the wait loop.
    pub wait_timeout: Duration,
    /// Emit per-migration progress log lines.
    pub verbose: bool,
    /// Filesystem used for migration discovery and reading.
    pub fs: Arc<dyn FileSystem>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            migrations_dir: vec![PathBuf::from("./db/migrations")],
            migrations_table: "schema_migrations".to_string(),
            schema_file: PathBuf::from("./db/schema.sql"),
            auto_dump_schema: true,
            strict: false,
            wait_before: false,
            wait_interval: Duration::from_secs(1),
            wait_timeout: Duration::from_secs(60),
            verbose: false,
            fs: Arc::new(HostFileSystem),
        }
    }
}

impl EngineConfig {
    /// Create a configuration for a database URL with all other settings at
    /// their defaults.
    pub fn new(database_url: Url) -> Self {
        Self {
            database_url: Some(database_url),
            ..Self::default()
        }
    }

    /// Set the migration directory roots.
    pub fn migrations_dir(mut self, dirs: Vec<PathBuf>) -> Self {
        self.migrations_dir = dirs;
        self
    }

    /// Set the ledger table name.
    pub fn migrations_table(mut self, table: impl Into<String>) -> Self {
        self.migrations_table = table.into();
        self
    }

    /// Set the schema file path.
    pub fn schema_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.schema_file = path.into();
        self
    }

    /// Enable or disable automatic schema dumping.
    pub fn auto_dump_schema(mut self, dump: bool) -> Self {
        self.auto_dump_schema = dump;
        self
    }

    /// Enable or disable strict ordering.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Wait for connectivity before every operation.
    pub fn wait_before(mut self, wait: bool) -> Self {
        self.wait_before = wait;
        self
    }

    /// Set the wait poll interval.
    pub fn wait_interval(mut self, interval: Duration) -> Self {
        self.wait_interval = interval;
        self
    }

    /// Set the wait deadline.
    pub fn wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = timeout;
        self
    }

    /// Enable or disable verbose progress output.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Use a custom filesystem for migration discovery.
    pub fn filesystem(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }
}

/// Migration status summary returned by [`Engine::status`].
#[derive(Debug)]
pub struct MigrationStatus {
    /// All discovered migrations, labelled applied or pending.
    pub migrations: Vec<Migration>,
    /// Count of applied migrations.
    pub applied: usize,
    /// Count of pending migrations.
    pub pending: usize,
}

/// The migration engine.
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    /// Create an engine from a configuration snapshot.
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Create an engine for a URL with default settings.
    pub fn from_url(database_url: Url) -> Self {
        Self::new(EngineConfig::new(database_url))
    }

    /// The engine's configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Resolve the driver for the configured database URL.
    pub fn driver(&self) -> Result<Box<dyn Driver>> {
        let url = self.config.database_url.as_ref().ok_or(Error::InvalidUrl)?;
        resolve_driver(url, &self.config.migrations_table)
    }

    /// Create the target database.
    pub async fn create(&self) -> Result<()> {
        let driver = self.driver()?;
        self.wait_if_configured(driver.as_ref()).await?;
        driver.create_database().await
    }

    /// Drop the target database. Dropping a missing database succeeds.
    pub async fn drop(&self) -> Result<()> {
        let driver = self.driver()?;
        self.wait_if_configured(driver.as_ref()).await?;
        driver.drop_database().await
    }

    /// Apply all pending migrations in version order.
    pub async fn migrate(&self) -> Result<()> {
        let driver = self.driver()?;
        self.wait_if_configured(driver.as_ref()).await?;
        self.migrate_with(driver.as_ref()).await
    }

    /// Create the database if it does not exist, then migrate.
    pub async fn create_and_migrate(&self) -> Result<()> {
        let driver = self.driver()?;
        self.wait_if_configured(driver.as_ref()).await?;
        if !driver.database_exists().await? {
            driver.create_database().await?;
        }
        self.migrate_with(driver.as_ref()).await
    }

    async fn migrate_with(&self, driver: &dyn Driver) -> Result<()> {
        let mut records = find_migration_files(&self.config.migrations_dir, &self.config.fs)?;
        let mut conn = driver.open().await?;
        let result = self.migrate_on(&mut *conn, driver, &mut records).await;
        let _ = conn.close().await;
        result?;

        if self.config.auto_dump_schema {
            self.dump_schema_with(driver).await?;
        }
        Ok(())
    }

    async fn migrate_on(
        &self,
        conn: &mut dyn Connection,
        driver: &dyn Driver,
        records: &mut [Migration],
    ) -> Result<()> {
        conn.create_migrations_table().await?;
        let applied: HashSet<String> = conn.applied_migrations(None).await?.into_iter().collect();
        reconcile::apply_ledger(records, &applied);
        reconcile::check_order(records, self.config.strict, &applied)?;

        for migration in records.iter().filter(|m| !m.applied) {
            let parsed = migration.parse()?;
            run_section(
                conn,
                driver,
                migration,
                &parsed,
                SectionKind::Up,
                self.config.verbose,
            )
            .await?;
        }
        Ok(())
    }

    /// Reverse the most recently applied migration.
    pub async fn rollback(&self) -> Result<()> {
        let driver = self.driver()?;
        self.wait_if_configured(driver.as_ref()).await?;

        let mut records = find_migration_files(&self.config.migrations_dir, &self.config.fs)?;
        let mut conn = driver.open().await?;
        let result = self
            .rollback_on(&mut *conn, driver.as_ref(), &mut records)
            .await;
        let _ = conn.close().await;
        result?;

        if self.config.auto_dump_schema {
            self.dump_schema_with(driver.as_ref()).await?;
        }
        Ok(())
    }

    async fn rollback_on(
        &self,
        conn: &mut dyn Connection,
        driver: &dyn Driver,
        records: &mut [Migration],
    ) -> Result<()> {
        conn.create_migrations_table().await?;
        // The full ledger, always: the target is the numerically greatest
        // applied version, and SQL text ordering disagrees with numeric
        // ordering for unequal-length versions (9 vs 10).
        let applied: HashSet<String> = conn.applied_migrations(None).await?.into_iter().collect();
        if applied.is_empty() {
            return Err(Error::NothingToRollback);
        }
        reconcile::apply_ledger(records, &applied);

        let target = match reconcile::rollback_target(records) {
            Some(target) => target,
            None => {
                let newest = applied
                    .iter()
                    .max_by(|a, b| compare_versions(a, b))
                    .cloned()
                    .unwrap_or_default();
                return Err(Error::RollbackFileMissing(newest));
            }
        };
        let parsed = target.parse()?;
        run_section(
            conn,
            driver,
            target,
            &parsed,
            SectionKind::Down,
            self.config.verbose,
        )
        .await
    }

    /// Discover migrations and label them against the ledger without
    /// executing anything. The ledger table is not created if absent.
    pub async fn find_migrations(&self) -> Result<Vec<Migration>> {
        let driver = self.driver()?;
        self.wait_if_configured(driver.as_ref()).await?;

        let mut records = find_migration_files(&self.config.migrations_dir, &self.config.fs)?;
        let mut conn = driver.open().await?;
        let applied: HashSet<String> = if conn.migrations_table_exists().await? {
            conn.applied_migrations(None).await?.into_iter().collect()
        } else {
            HashSet::new()
        };
        reconcile::apply_ledger(&mut records, &applied);
        conn.close().await?;
        Ok(records)
    }

    /// Summarize applied and pending migrations.
    pub async fn status(&self) -> Result<MigrationStatus> {
        let migrations = self.find_migrations().await?;
        let applied = migrations.iter().filter(|m| m.applied).count();
        let pending = migrations.len() - applied;
        Ok(MigrationStatus {
            migrations,
            applied,
            pending,
        })
    }

    /// Dump the live schema to the configured schema file.
    pub async fn dump_schema(&self) -> Result<()> {
        let driver = self.driver()?;
        self.wait_if_configured(driver.as_ref()).await?;
        self.dump_schema_with(driver.as_ref()).await
    }

    async fn dump_schema_with(&self, driver: &dyn Driver) -> Result<()> {
        let bytes = driver.dump_schema().await?;
        let path = &self.config.schema_file;
        let describe = |source| Error::SchemaWrite {
            path: path.display().to_string(),
            source,
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(describe)?;
            }
        }

        // Temp file plus rename, so the schema file is never half-written.
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        tokio::fs::write(&tmp, &bytes).await.map_err(describe)?;
        tokio::fs::rename(&tmp, path).await.map_err(describe)?;
        debug!("wrote schema to {}", path.display());
        Ok(())
    }

    /// Scaffold a new migration file in the first configured directory.
    pub async fn new_migration(&self, name: &str) -> Result<PathBuf> {
        let slug = slugify(name);
        if slug.is_empty() {
            return Err(Error::InvalidMigrationName(name.to_string()));
        }
        let dir = self
            .config
            .migrations_dir
            .first()
            .cloned()
            .unwrap_or_else(|| PathBuf::from("./db/migrations"));
        tokio::fs::create_dir_all(&dir).await?;

        let version = Utc::now().format("%Y%m%d%H%M%S");
        let file_path = dir.join(format!("{version}_{slug}.sql"));
        tokio::fs::write(&file_path, MIGRATION_TEMPLATE).await?;
        debug!("created migration {}", file_path.display());
        Ok(file_path)
    }

    /// Block until the database accepts connections or the wait deadline
    /// passes, returning the last connection error on timeout.
    pub async fn wait(&self) -> Result<()> {
        let driver = self.driver()?;
        self.wait_for(driver.as_ref()).await
    }

    async fn wait_if_configured(&self, driver: &dyn Driver) -> Result<()> {
        if self.config.wait_before {
            self.wait_for(driver).await
        } else {
            Ok(())
        }
    }

    async fn wait_for(&self, driver: &dyn Driver) -> Result<()> {
        let deadline = Instant::now() + self.config.wait_timeout;
        loop {
            let err = match driver.ping().await {
                Ok(()) => return Ok(()),
                Err(err) => err,
            };
            if Instant::now() >= deadline {
                return Err(err);
            }
            warn!("waiting for database: {err}");
            sleep(self.config.wait_interval).await;
        }
    }
}

fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_was_separator = true;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.extend(ch.to_lowercase());
            last_was_separator = false;
        } else if !last_was_separator {
            slug.push('_');
            last_was_separator = true;
        }
    }
    slug.trim_end_matches('_').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = EngineConfig::default();
        assert!(config.database_url.is_none());
        assert_eq!(config.migrations_dir, vec![PathBuf::from("./db/migrations")]);
        assert_eq!(config.migrations_table, "schema_migrations");
        assert_eq!(config.schema_file, PathBuf::from("./db/schema.sql"));
        assert!(config.auto_dump_schema);
        assert!(!config.strict);
        assert!(!config.wait_before);
        assert_eq!(config.wait_interval, Duration::from_secs(1));
        assert_eq!(config.wait_timeout, Duration::from_secs(60));
        assert!(!config.verbose);
    }

    #[test]
    fn test_config_builder() {
        let url = Url::parse("postgres://localhost/app").unwrap();
        let config = EngineConfig::new(url.clone())
            .migrations_dir(vec![PathBuf::from("./sql")])
            .migrations_table("app_migrations")
            .schema_file("./sql/schema.sql")
            .auto_dump_schema(false)
            .strict(true)
            .verbose(true)
            .wait_interval(Duration::from_millis(10));
        assert_eq!(config.database_url, Some(url));
        assert_eq!(config.migrations_dir, vec![PathBuf::from("./sql")]);
        assert_eq!(config.migrations_table, "app_migrations");
        assert!(!config.auto_dump_schema);
        assert!(config.strict);
        assert!(config.verbose);
        assert_eq!(config.wait_interval, Duration::from_millis(10));
    }

    #[test]
    fn test_missing_url_yields_invalid_url() {
        let engine = Engine::new(EngineConfig::default());
        let err = match engine.driver() {
            Err(e) => e,
            Ok(_) => panic!("expected an error"),
        };
        assert_eq!(
            err.to_string(),
            "invalid url, have you set your --url flag or DATABASE_URL environment variable?"
        );
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Create Users Table"), "create_users_table");
        assert_eq!(slugify("add-index!!"), "add_index");
        assert_eq!(slugify("  "), "");
        assert_eq!(slugify("already_snake"), "already_snake");
    }
}
