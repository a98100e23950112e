use std::path::{Path, PathBuf};

use rusqlite::{Connection, OpenFlags};
use tracing::{debug, info};

use crate::error::StoreError;

/// Owned handle to the SQLite database. Every binding borrows it per call, so
/// the connection lives exactly as long as the `Store` and is closed
/// explicitly on shutdown.
pub struct Store {
    conn: Connection,
    path: PathBuf,
}

impl Store {
    /// Open an existing database file. The file is never created: a missing or
    /// unreadable database is a `StoreError::Connection`, which the binary
    /// treats as fatal. `PRAGMA foreign_keys = ON` is toggled so the join
    /// tables behave the same here as in any other client.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let connection_error = |source| StoreError::Connection {
            path: path.to_path_buf(),
            source,
        };

        let conn = Connection::open_with_flags(path, flags).map_err(connection_error)?;
        // SQLite opens lazily; touching the schema surfaces files that are not
        // databases at all.
        conn.query_row("SELECT count(*) FROM sqlite_master", [], |row| {
            row.get::<_, i64>(0)
        })
        .map_err(connection_error)?;
        conn.execute("PRAGMA foreign_keys = ON", [])
            .map_err(connection_error)?;

        info!(path = %path.display(), "database connection established");
        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    /// Private in-memory database, handy for tooling and tests that build
    /// their own schema.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        Ok(Self {
            conn,
            path: PathBuf::from(":memory:"),
        })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Close the connection, reporting any error SQLite raises while
    /// finalizing.
    pub fn close(self) -> Result<(), StoreError> {
        let path = self.path;
        self.conn.close().map_err(|(_, err)| StoreError::Sql(err))?;
        debug!(path = %path.display(), "database connection closed");
        Ok(())
    }
}
