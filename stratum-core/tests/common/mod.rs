//! Test support: an in-memory database driver plus fixture helpers.
//!
//! The fake driver registers under the `fake` scheme. Each URL path selects
//! an independent in-memory database on a process-wide "server", so tests
//! can run in parallel without sharing state. SQL containing the marker
//! `not_valid_sql` fails with a Postgres-style error position (a 1-based
//! character offset into the submitted string).

use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, Once, OnceLock};

use async_trait::async_trait;
use url::Url;

use stratum_core::{
    register_driver, Connection, Driver, DriverConfig, Engine, EngineConfig, Error, FileSystem,
    MemoryFileSystem, Result,
};

/// State of one fake database.
#[derive(Debug)]
pub struct FakeDb {
    pub exists: bool,
    pub reachable: bool,
    pub table_created: bool,
    pub applied: BTreeSet<String>,
    pub executed: Vec<String>,
}

impl FakeDb {
    fn new() -> Self {
        Self {
            exists: false,
            reachable: true,
            table_created: false,
            applied: BTreeSet::new(),
            executed: Vec::new(),
        }
    }
}

static SERVER: OnceLock<Mutex<HashMap<String, Arc<Mutex<FakeDb>>>>> = OnceLock::new();

/// Fetch (or create) the named fake database.
pub fn database(name: &str) -> Arc<Mutex<FakeDb>> {
    SERVER
        .get_or_init(|| Mutex::new(HashMap::new()))
        .lock()
        .expect("fake server lock")
        .entry(name.to_string())
        .or_insert_with(|| Arc::new(Mutex::new(FakeDb::new())))
        .clone()
}

#[derive(Debug)]
struct FakeDriver {
    db: Arc<Mutex<FakeDb>>,
}

fn fake_factory(config: DriverConfig) -> Result<Box<dyn Driver>> {
    let name = config.url.path().trim_matches('/').to_string();
    Ok(Box::new(FakeDriver {
        db: database(&name),
    }))
}

#[async_trait]
impl Driver for FakeDriver {
    async fn open(&self) -> Result<Box<dyn Connection>> {
        if !self.db.lock().expect("fake db lock").reachable {
            return Err(Error::connection("connection refused"));
        }
        Ok(Box::new(FakeConnection {
            db: self.db.clone(),
            snapshot: None,
        }))
    }

    async fn create_database(&self) -> Result<()> {
        let mut db = self.db.lock().expect("fake db lock");
        if db.exists {
            return Err(Error::driver("database already exists"));
        }
        db.exists = true;
        Ok(())
    }

    async fn drop_database(&self) -> Result<()> {
        let mut db = self.db.lock().expect("fake db lock");
        db.exists = false;
        db.table_created = false;
        db.applied.clear();
        db.executed.clear();
        Ok(())
    }

    async fn database_exists(&self) -> Result<bool> {
        Ok(self.db.lock().expect("fake db lock").exists)
    }

    async fn dump_schema(&self) -> Result<Vec<u8>> {
        let db = self.db.lock().expect("fake db lock");
        let mut dump = String::from("-- Fake database dump\n");
        if !db.applied.is_empty() {
            dump.push_str("\n-- Schema migrations\n\nINSERT INTO schema_migrations (version) VALUES\n");
            let rows: Vec<String> = db.applied.iter().map(|v| format!("    ('{v}')")).collect();
            dump.push_str(&rows.join(",\n"));
            dump.push_str(";\n");
        }
        Ok(dump.into_bytes())
    }

    fn supports_transactional_ddl(&self) -> bool {
        true
    }
}

struct FakeConnection {
    db: Arc<Mutex<FakeDb>>,
    snapshot: Option<(BTreeSet<String>, bool)>,
}

#[async_trait]
impl Connection for FakeConnection {
    async fn execute(&mut self, sql: &str) -> Result<u64> {
        let mut db = self.db.lock().expect("fake db lock");
        db.executed.push(sql.to_string());
        if let Some(byte_index) = sql.find("not_valid_sql") {
            let position = sql[..byte_index].chars().count() + 1;
            return Err(Error::sql(
                "syntax error at or near \"not_valid_sql\"",
                Some(position),
            ));
        }
        Ok(0)
    }

    async fn begin(&mut self) -> Result<()> {
        let mut db = self.db.lock().expect("fake db lock");
        db.executed.push("BEGIN".to_string());
        self.snapshot = Some((db.applied.clone(), db.table_created));
        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        let mut db = self.db.lock().expect("fake db lock");
        db.executed.push("COMMIT".to_string());
        self.snapshot = None;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        let mut db = self.db.lock().expect("fake db lock");
        db.executed.push("ROLLBACK".to_string());
        if let Some((applied, table_created)) = self.snapshot.take() {
            db.applied = applied;
            db.table_created = table_created;
        }
        Ok(())
    }

    async fn migrations_table_exists(&mut self) -> Result<bool> {
        Ok(self.db.lock().expect("fake db lock").table_created)
    }

    async fn create_migrations_table(&mut self) -> Result<()> {
        self.db.lock().expect("fake db lock").table_created = true;
        Ok(())
    }

    async fn applied_migrations(&mut self, limit: Option<usize>) -> Result<Vec<String>> {
        let db = self.db.lock().expect("fake db lock");
        Ok(match limit {
            Some(n) => db.applied.iter().rev().take(n).cloned().collect(),
            None => db.applied.iter().cloned().collect(),
        })
    }

    async fn insert_migration(&mut self, version: &str) -> Result<()> {
        self.db
            .lock()
            .expect("fake db lock")
            .applied
            .insert(version.to_string());
        Ok(())
    }

    async fn delete_migration(&mut self, version: &str) -> Result<()> {
        self.db.lock().expect("fake db lock").applied.remove(version);
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Register the fake driver once per process.
pub fn setup() {
    static REGISTER: Once = Once::new();
    REGISTER.call_once(|| {
        register_driver("fake", fake_factory).expect("register fake driver");
    });
}

/// Build an in-memory filesystem from (path, contents) pairs.
pub fn memory_fs(files: &[(&str, &str)]) -> Arc<dyn FileSystem> {
    let fs = MemoryFileSystem::new();
    for (path, contents) in files {
        fs.insert(path, contents.as_bytes().to_vec());
    }
    Arc::new(fs)
}

/// Engine configuration against the named fake database, with schema
/// auto-dumping off (tests that want it turn it back on).
pub fn config(db_name: &str, fs: Arc<dyn FileSystem>) -> EngineConfig {
    setup();
    let url = Url::parse(&format!("fake://server/{db_name}")).expect("fake url");
    EngineConfig::new(url)
        .auto_dump_schema(false)
        .filesystem(fs)
}

/// Engine against the named fake database.
pub fn engine(db_name: &str, fs: Arc<dyn FileSystem>) -> Engine {
    Engine::new(config(db_name, fs))
}

/// The standard two-migration fixture: users then posts.
pub fn users_posts_fs() -> Arc<dyn FileSystem> {
    memory_fs(&[
        (
            "db/migrations/001_create_users.sql",
            "-- migrate:up\ncreate table users (id serial, name text);\n-- migrate:down\ndrop table users;\n",
        ),
        (
            "db/migrations/002_create_posts.sql",
            "-- migrate:up\ncreate table posts (id serial, title text);\n-- migrate:down\ndrop table posts;\n",
        ),
    ])
}

/// Absolute path helper for schema-file tests.
pub fn temp_schema_path(dir: &tempfile::TempDir) -> PathBuf {
    dir.path().join("schema").join("schema.sql")
}
