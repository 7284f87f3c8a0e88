//! Migration file discovery.
//!
//! Enumerates the configured roots through the filesystem abstraction,
//! keeps files whose names match `<digits>_<anything>.sql`, and sorts the
//! result by numeric version. A version appearing under more than one root
//! (or twice in one root) is a fatal discovery error.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::fs::{join_clean, FileSystem};
use crate::migration::Migration;

/// Extract the version token from a candidate file name, or `None` when the
/// name does not match `^[0-9]+_.*\.sql$`.
pub(crate) fn parse_version(file_name: &str) -> Option<&str> {
    let stem = file_name.strip_suffix(".sql")?;
    let digits = stem
        .find(|c: char| !c.is_ascii_digit())
        .map_or(stem.len(), |i| i);
    if digits == 0 || !stem[digits..].starts_with('_') {
        return None;
    }
    Some(&file_name[..digits])
}

/// Compare two version tokens numerically: shorter digit runs (after
/// stripping leading zeros) sort first, equal lengths compare
/// lexicographically, and exact ties fall back to the raw token.
pub(crate) fn compare_versions(a: &str, b: &str) -> Ordering {
    let a_stripped = a.trim_start_matches('0');
    let b_stripped = b.trim_start_matches('0');
    a_stripped
        .len()
        .cmp(&b_stripped.len())
        .then_with(|| a_stripped.cmp(b_stripped))
        .then_with(|| a.cmp(b))
}

/// Enumerate all migration files under the given roots, sorted ascending by
/// version.
pub(crate) fn find_migration_files(
    dirs: &[PathBuf],
    fs: &Arc<dyn FileSystem>,
) -> Result<Vec<Migration>> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut migrations = Vec::new();

    for dir in dirs {
        let names = fs.read_dir(dir).map_err(|source| Error::ReadDir {
            path: dir.display().to_string(),
            source,
        })?;
        for name in names {
            let Some(version) = parse_version(&name) else {
                continue;
            };
            let file_path = join_clean(dir, &name);
            if !seen.insert(version.to_string()) {
                return Err(Error::DuplicateVersion {
                    version: version.to_string(),
                    path: file_path.display().to_string(),
                });
            }
            migrations.push(Migration {
                version: version.to_string(),
                file_name: name,
                file_path,
                applied: false,
                fs: Arc::clone(fs),
            });
        }
    }

    migrations.sort_by(|a, b| compare_versions(&a.version, &b.version));
    Ok(migrations)
}
