//! Typed failures for the persistence and editing layers. The UI and binary
//! wrap these in `anyhow` and only ever show the innermost message.

use std::path::PathBuf;

use thiserror::Error;

use crate::editor::SessionState;

/// Failures raised while talking to the SQLite store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The database file could not be opened at startup.
    #[error("failed to open database at {}", path.display())]
    Connection {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },
    /// A configured table does not resolve to a rowid table in the store.
    #[error("table `{table}` is not available in the database")]
    Schema {
        table: String,
        #[source]
        source: Option<rusqlite::Error>,
    },
    /// A staged row failed to persist. Rows written earlier in the same batch
    /// stay written.
    #[error("failed to save row {} of `{table}`", row + 1)]
    Commit {
        table: String,
        row: usize,
        #[source]
        source: rusqlite::Error,
    },
    #[error("failed to delete row {} of `{table}`", row + 1)]
    Delete {
        table: String,
        row: usize,
        #[source]
        source: rusqlite::Error,
    },
    /// A configured table name appears more than once.
    #[error("table `{table}` is configured more than once")]
    DuplicateTable { table: String },
    /// A stored row's `INTEGER PRIMARY KEY` cannot be cleared.
    #[error("`{column}` is the row key of `{table}` and cannot be empty")]
    KeyRequired { table: String, column: String },
    #[error("row {} is out of range ({len} rows)", row + 1)]
    RowOutOfRange { row: usize, len: usize },
    #[error("column {} is out of range ({len} columns)", column + 1)]
    ColumnOutOfRange { column: usize, len: usize },
    #[error(transparent)]
    Sql(#[from] rusqlite::Error),
}

/// Rejections produced before anything reaches the store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Password must be shorter than 8 characters and contain at least 2 digits and 1 other character.")]
    WeakPassword,
    #[error("Expected {expected} values but got {actual}.")]
    ColumnCount { expected: usize, actual: usize },
}

/// Outcome of a failed save attempt in the record editor.
#[derive(Debug, Error)]
pub enum SaveError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("The record editor is already closed ({0:?}).")]
    Closed(SessionState),
}

/// Failures returned by `Workspace::dispatch`.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("No table selected.")]
    NoTableSelected,
    #[error(transparent)]
    Save(#[from] SaveError),
    #[error(transparent)]
    Store(#[from] StoreError),
}
