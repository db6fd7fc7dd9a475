//! Error types shared across the crate.

use thiserror::Error;

use crate::config::{ConnectionError, SettingsError};

/// Result type for grammar compilation.
pub type GrammarResult<T> = std::result::Result<T, GrammarError>;

/// Result type for operations that may touch a connection.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors raised while compiling a query or blueprint into SQL.
///
/// These are deterministic: the same input always produces the same error,
/// and they are always raised before any statement reaches a connection.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GrammarError {
    /// The target engine has no way to express the requested operation.
    #[error("This database engine does not support {0}.")]
    Unsupported(&'static str),

    /// A blueprint holds a combination of commands the engine cannot apply.
    #[error("{0}")]
    InvalidBlueprint(String),

    /// The query is missing something a statement needs (e.g. a table).
    #[error("invalid query: {0}")]
    InvalidQuery(String),
}

/// Crate-level error.
#[derive(Error, Debug)]
pub enum Error {
    /// Compilation failed.
    #[error(transparent)]
    Grammar(#[from] GrammarError),

    /// A statement failed on the database.
    #[error("{source} (SQL: {sql})")]
    Query {
        /// The statement that failed.
        sql: String,
        /// Driver error, surfaced unchanged.
        #[source]
        source: rusqlite::Error,
    },

    /// Opening the SQLite database failed.
    #[error("failed to open database: {0}")]
    Open(#[from] rusqlite::Error),

    /// A statement returned a result that could not be interpreted.
    #[error("unexpected result: {0}")]
    UnexpectedResult(String),

    /// Configuration could not be loaded.
    #[error(transparent)]
    Settings(#[from] SettingsError),

    /// Connection configuration is invalid.
    #[error(transparent)]
    Connection(#[from] ConnectionError),
}
