//! Filesystem abstraction for migration discovery.
//!
//! The engine only ever needs two capabilities: list the files in a
//! directory, and read a file as bytes. The default binding goes to the host
//! filesystem; tests and embedded deployments can supply a
//! [`MemoryFileSystem`] instead. Absolute paths on the host binding are used
//! verbatim.

use std::collections::BTreeMap;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Mutex;

/// Narrow filesystem capability used by the migration file store.
pub trait FileSystem: std::fmt::Debug + Send + Sync {
    /// List the names of regular files directly under `dir`.
    fn read_dir(&self, dir: &Path) -> io::Result<Vec<String>>;

    /// Read the full contents of `path`.
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;
}

/// The host filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct HostFileSystem;

impl FileSystem for HostFileSystem {
    fn read_dir(&self, dir: &Path) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        Ok(names)
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }
}

/// An in-memory filesystem backed by a path → bytes map.
///
/// Paths are stored with any leading `./` removed, so roots like
/// `./db/migrations` and keys like `db/migrations/001_init.sql` line up.
#[derive(Debug, Default)]
pub struct MemoryFileSystem {
    files: Mutex<BTreeMap<PathBuf, Vec<u8>>>,
}

impl MemoryFileSystem {
    /// Create an empty in-memory filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a file.
    pub fn insert(&self, path: impl AsRef<Path>, contents: impl Into<Vec<u8>>) {
        self.files
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(clean_path(path.as_ref()), contents.into());
    }
}

impl FileSystem for MemoryFileSystem {
    fn read_dir(&self, dir: &Path) -> io::Result<Vec<String>> {
        let dir = clean_path(dir);
        let files = self.files.lock().unwrap_or_else(|e| e.into_inner());
        let names: Vec<String> = files
            .keys()
            .filter(|path| path.parent() == Some(dir.as_path()))
            .filter_map(|path| path.file_name())
            .filter_map(|name| name.to_str().map(String::from))
            .collect();
        if names.is_empty() && !files.keys().any(|path| path.starts_with(&dir)) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no such directory: {}", dir.display()),
            ));
        }
        Ok(names)
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.files
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&clean_path(path))
            .cloned()
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("no such file: {}", path.display()),
                )
            })
    }
}

/// Remove `.` components so joined paths read the way they were configured
/// (`./db/migrations` + `001_init.sql` → `db/migrations/001_init.sql`).
/// Absolute paths pass through untouched.
pub(crate) fn clean_path(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

/// Join a file name onto a root directory and clean the result.
pub(crate) fn join_clean(dir: &Path, name: &str) -> PathBuf {
    clean_path(&dir.join(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_path_strips_leading_dot() {
        assert_eq!(
            clean_path(Path::new("./db/migrations")),
            PathBuf::from("db/migrations")
        );
        assert_eq!(clean_path(Path::new("/abs/dir")), PathBuf::from("/abs/dir"));
    }

    #[test]
    fn test_join_clean() {
        assert_eq!(
            join_clean(Path::new("./db/migrations"), "001_init.sql"),
            PathBuf::from("db/migrations/001_init.sql")
        );
    }

    #[test]
    fn test_memory_fs_read_dir_lists_direct_children_only() {
        let fs = MemoryFileSystem::new();
        fs.insert("db/migrations/001_a.sql", b"x".to_vec());
        fs.insert("db/migrations/002_b.sql", b"y".to_vec());
        fs.insert("db/migrations/nested/003_c.sql", b"z".to_vec());
        fs.insert("db/not_migrations/004_d.sql", b"w".to_vec());

        let mut names = fs.read_dir(Path::new("./db/migrations")).unwrap();
        names.sort();
        assert_eq!(names, vec!["001_a.sql", "002_b.sql"]);
    }

    #[test]
    fn test_memory_fs_missing_dir_errors() {
        let fs = MemoryFileSystem::new();
        fs.insert("db/migrations/001_a.sql", b"x".to_vec());
        assert!(fs.read_dir(Path::new("db/elsewhere")).is_err());
    }

    #[test]
    fn test_memory_fs_read() {
        let fs = MemoryFileSystem::new();
        fs.insert("./db/migrations/001_a.sql", b"hello".to_vec());
        let bytes = fs.read(Path::new("db/migrations/001_a.sql")).unwrap();
        assert_eq!(bytes, b"hello");
    }

    #[test]
    fn test_host_fs_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("001_a.sql"), "-- migrate:up\n").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();

        let fs = HostFileSystem;
        let names = fs.read_dir(dir.path()).unwrap();
        assert_eq!(names, vec!["001_a.sql"]);
        let bytes = fs.read(&dir.path().join("001_a.sql")).unwrap();
        assert_eq!(bytes, b"-- migrate:up\n");
    }
}
