//! Reconciliation between discovered migration files and the ledger.

use std::collections::HashSet;

use tracing::warn;

use crate::error::{Error, Result};
use crate::finder::compare_versions;
use crate::migration::Migration;

/// Label each record applied or pending against the ledger set, and warn
/// about orphans (applied versions with no file on disk).
pub(crate) fn apply_ledger(migrations: &mut [Migration], applied: &HashSet<String>) {
    for migration in migrations.iter_mut() {
        migration.applied = applied.contains(&migration.version);
    }

    let known: HashSet<&str> = migrations.iter().map(|m| m.version.as_str()).collect();
    let mut orphans: Vec<&str> = applied
        .iter()
        .map(String::as_str)
        .filter(|version| !known.contains(version))
        .collect();
    if !orphans.is_empty() {
        orphans.sort_by(|a, b| compare_versions(a, b));
        warn!(
            "applied migrations with no matching file: {}",
            orphans.join(", ")
        );
    }
}

/// Enforce the strict ordering policy: every pending version must be
/// greater than every version in the ledger, orphaned or not.
pub(crate) fn check_order(
    migrations: &[Migration],
    strict: bool,
    applied: &HashSet<String>,
) -> Result<()> {
    if !strict {
        return Ok(());
    }
    let Some(max_applied) = applied
        .iter()
        .map(String::as_str)
        .max_by(|a, b| compare_versions(a, b))
    else {
        return Ok(());
    };
    for migration in migrations.iter().filter(|m| !m.applied) {
        if compare_versions(&migration.version, max_applied).is_le() {
            return Err(Error::OutOfOrder(migration.version.clone()));
        }
    }
    Ok(())
}

/// The newest applied migration that still has a file on disk; the only
/// candidate whose down SQL is available for rollback.
pub(crate) fn rollback_target(migrations: &[Migration]) -> Option<&Migration> {
    migrations.iter().rev().find(|m| m.applied)
}
