//! SQLite-backed working store for the item catalog, stock levels, and daily prep lists.
//!
//! The database lives at `~/.preplist/preplist.db` unless the config points elsewhere.
//! Stock and prep-list rows are shared with other devices through the same file, so
//! every write that must not lose updates is expressed in SQL (`ON CONFLICT` upserts,
//! `quantity = quantity + ?`) rather than read-then-write in Rust.

use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::Connection;

pub mod types;
pub use types::*;

pub mod items;
pub mod prep_list;
pub mod stock;

/// How long a writer waits on a locked database before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub struct PrepDb {
    conn: Connection,
}

impl PrepDb {
    /// Borrow the underlying connection for ad-hoc queries.
    pub fn conn_ref(&self) -> &Connection {
        &self.conn
    }

    /// Execute a closure within a SQLite transaction.
    /// Commits on Ok, rolls back on Err.
    pub fn with_transaction<F, T>(&self, f: F) -> Result<T, DbError>
    where
        F: FnOnce(&Self) -> Result<T, DbError>,
    {
        self.conn.execute_batch("BEGIN IMMEDIATE")?;
        match f(self) {
            Ok(val) => {
                if let Err(e) = self.conn.execute_batch("COMMIT") {
                    let _ = self.conn.execute_batch("ROLLBACK");
                    return Err(e.into());
                }
                Ok(val)
            }
            Err(e) => {
                let _ = self.conn.execute_batch("ROLLBACK");
                Err(e)
            }
        }
    }

    /// Open (or create) the database at `~/.preplist/preplist.db` and apply the schema.
    pub fn open() -> Result<Self, DbError> {
        let path = Self::default_path()?;
        Self::open_at(path)
    }

    /// Open a database at an explicit path.
    pub fn open_at(path: PathBuf) -> Result<Self, DbError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(DbError::CreateDir)?;
            }
        }

        let conn = Connection::open(&path)?;

        // Enable WAL mode for better concurrent read performance
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.busy_timeout(BUSY_TIMEOUT)?;

        crate::migrations::run_migrations(&conn).map_err(DbError::Migration)?;

        // Set after migrations so table rebuilds can toggle it freely.
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        Ok(Self { conn })
    }

    /// Open whatever `path` the config names, falling back to the default location.
    pub fn open_configured(path: Option<&Path>) -> Result<Self, DbError> {
        match path {
            Some(p) => Self::open_at(p.to_path_buf()),
            None => Self::open(),
        }
    }

    /// Resolve the default database path: `~/.preplist/preplist.db`.
    pub fn default_path() -> Result<PathBuf, DbError> {
        let home = dirs::home_dir().ok_or(DbError::HomeDirNotFound)?;
        Ok(home.join(".preplist").join("preplist.db"))
    }
}

// =============================================================================
// Shared test utilities
// =============================================================================

#[cfg(test)]
pub mod test_utils {
    use super::PrepDb;

    /// Create a temporary database for testing.
    ///
    /// We leak the `TempDir` so the directory persists for the duration of the test.
    pub fn test_db() -> PrepDb {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("test.db");
        std::mem::forget(dir);
        PrepDb::open_at(path).expect("Failed to open test database")
    }
}

// =============================================================================
// Tests
// =============================================================================
