//! Execution of a single migration section.
//!
//! A section runs as one batch on the open connection. When the section asks
//! for a transaction and the driver supports transactional DDL, the batch
//! and the ledger mutation commit together; otherwise the ledger mutation is
//! issued as a separate statement after the batch succeeds. SQL failures are
//! mapped back to a line/column/position in the original migration file.

use tracing::{info, warn};

use crate::driver::{Connection, Driver};
use crate::error::{Error, Result};
use crate::migration::{Migration, MigrationSection, ParsedMigration};
use crate::position::locate;

/// Which half of a migration to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SectionKind {
    Up,
    Down,
}

/// Run one section of a parsed migration and record the outcome in the
/// ledger.
pub(crate) async fn run_section(
    conn: &mut dyn Connection,
    driver: &dyn Driver,
    migration: &Migration,
    parsed: &ParsedMigration,
    kind: SectionKind,
    verbose: bool,
) -> Result<()> {
    let section = match kind {
        SectionKind::Up => &parsed.up,
        SectionKind::Down => parsed
            .down
            .as_ref()
            .ok_or_else(|| Error::MissingDownSection(migration.file_name.clone()))?,
    };

    if verbose {
        match kind {
            SectionKind::Up => info!("Applying: {}", migration.file_name),
            SectionKind::Down => info!("Rolling back: {}", migration.file_name),
        }
    }

    let transactional = section.options.transaction && driver.supports_transactional_ddl();
    if section.options.transaction && !driver.supports_transactional_ddl() {
        warn!(
            "{}: transaction requested but the driver does not support transactional DDL",
            migration.file_name
        );
    }

    if transactional {
        conn.begin().await?;
    }

    let rows = match conn.execute(&section.sql).await {
        Ok(rows) => rows,
        Err(err) => {
            if transactional {
                let _ = conn.rollback().await;
            }
            return Err(annotate(err, migration, parsed, section));
        }
    };

    let ledger_result = match kind {
        SectionKind::Up => conn.insert_migration(&migration.version).await,
        SectionKind::Down => conn.delete_migration(&migration.version).await,
    };
    if let Err(err) = ledger_result {
        if transactional {
            let _ = conn.rollback().await;
        }
        return Err(err);
    }

    if transactional {
        conn.commit().await?;
    }

    if verbose {
        info!("Rows affected: {}", rows);
    }
    Ok(())
}

/// Attach file/line/column/position context to a raw SQL error.
fn annotate(
    err: Error,
    migration: &Migration,
    parsed: &ParsedMigration,
    section: &MigrationSection,
) -> Error {
    match err {
        Error::Sql {
            message,
            position: Some(position),
        } => {
            let located = locate(&parsed.contents, section.offset, position);
            Error::Migration {
                file_name: migration.file_name.clone(),
                line: located.line,
                column: located.column,
                position: located.position,
                message,
            }
        }
        Error::Sql {
            message,
            position: None,
        } => Error::sql(format!("error in {}: {}", migration.file_name, message), None),
        other => other,
    }
}
