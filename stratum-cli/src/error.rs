//! CLI error types and result alias.

use miette::Diagnostic;
use thiserror::Error;

/// Result type alias for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// CLI error types
#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    /// Engine error, surfaced verbatim
    #[error(transparent)]
    #[diagnostic(code(stratum::engine))]
    Engine(#[from] stratum_core::Error),

    /// IO error
    #[error("IO error: {0}")]
    #[diagnostic(code(stratum::io))]
    Io(#[from] std::io::Error),
}
