//! Error types for the migration engine.

use thiserror::Error;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during migration operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The database URL is missing or has no scheme.
    #[error("invalid url, have you set your --url flag or DATABASE_URL environment variable?")]
    InvalidUrl,

    /// No driver is registered for the URL scheme.
    #[error("unsupported driver: {0}")]
    UnsupportedDriver(String),

    /// A driver was registered twice under the same scheme.
    #[error("driver already registered: {0}")]
    DriverAlreadyRegistered(String),

    /// Two migration files resolve to the same version.
    #[error("duplicate migration version {version} ({path})")]
    DuplicateVersion {
        /// The colliding version token.
        version: String,
        /// Path of the second file carrying the version.
        path: String,
    },

    /// A migrations directory could not be enumerated.
    #[error("reading migrations directory {path}: {source}")]
    ReadDir {
        /// The directory that failed to enumerate.
        path: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A migration file is malformed.
    #[error("parsing {path}: {message}")]
    Parse {
        /// Path of the offending file.
        path: String,
        /// What went wrong, including the line number where known.
        message: String,
    },

    /// Strict ordering rejected a pending migration.
    #[error("migration {0} is out of order")]
    OutOfOrder(String),

    /// Rollback was requested against an empty ledger.
    #[error("can't rollback: no migrations have been applied")]
    NothingToRollback,

    /// Every applied version is an orphan; no down SQL is available.
    #[error("can't rollback: no migration file found for applied version {0}")]
    RollbackFileMissing(String),

    /// The rollback target has no down section.
    #[error("can't rollback: {0} has no down section")]
    MissingDownSection(String),

    /// A new-migration name reduced to an empty slug.
    #[error("invalid migration name: {0:?}")]
    InvalidMigrationName(String),

    /// SQL execution failed and the failure was located in the source file.
    #[error("error in {file_name} line: {line}, column: {column}, position: {position}: {message}")]
    Migration {
        /// Name of the migration file that failed.
        file_name: String,
        /// 1-indexed line in the original file.
        line: usize,
        /// 1-indexed character column within the line.
        column: usize,
        /// 1-indexed character offset from the start of the file.
        position: usize,
        /// The driver's error text.
        message: String,
    },

    /// A raw SQL error from a driver. `position` is a 1-based character
    /// offset into the SQL string the driver was handed, when the backend
    /// reports one.
    #[error("{message}")]
    Sql {
        /// The driver's error text.
        message: String,
        /// 1-based character offset into the submitted SQL, if reported.
        position: Option<usize>,
    },

    /// The database could not be reached.
    #[error("unable to connect to database: {0}")]
    ConnectionFailed(String),

    /// Any other driver-side failure.
    #[error("database error: {0}")]
    Driver(String),

    /// Writing the schema file failed.
    #[error("writing schema file {path}: {source}")]
    SchemaWrite {
        /// Target schema file path.
        path: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a parse error for a file.
    pub fn parse(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a raw SQL error with an optional position.
    pub fn sql(message: impl Into<String>, position: Option<usize>) -> Self {
        Self::Sql {
            message: message.into(),
            position,
        }
    }

    /// Create a driver error.
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver(message.into())
    }

    /// Create a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::ConnectionFailed(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_url_message() {
        assert_eq!(
            Error::InvalidUrl.to_string(),
            "invalid url, have you set your --url flag or DATABASE_URL environment variable?"
        );
    }

    #[test]
    fn test_unsupported_driver_message() {
        assert_eq!(
            Error::UnsupportedDriver("foo".into()).to_string(),
            "unsupported driver: foo"
        );
    }

    #[test]
    fn test_empty_ledger_rollback_message() {
        assert_eq!(
            Error::NothingToRollback.to_string(),
            "can't rollback: no migrations have been applied"
        );
    }

    #[test]
    fn test_migration_error_carries_position() {
        let err = Error::Migration {
            file_name: "001_bad.sql".into(),
            line: 3,
            column: 1,
            position: 25,
            message: "syntax error".into(),
        };
        assert!(err
            .to_string()
            .contains("line: 3, column: 1, position: 25:"));
    }
}
