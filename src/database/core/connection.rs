//! Database connection management
//!
//! This module provides the SQLite connection wrapper that the persistence
//! engine is built on, plus the catalog helpers used by the fallback drop path.

use anyhow::{anyhow, Result};
use rusqlite::Connection;
use std::time::Duration;
use tracing::debug;

/// Default time SQLite waits on a locked database before giving up
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

/// Core database connection wrapper
///
/// `DatabaseConn` provides a thin wrapper around SQLite connections,
/// handling both file-based and in-memory databases with consistent
/// configuration and error handling. Foreign key enforcement is always on.
pub struct DatabaseConn {
    pub conn: Connection,
}

impl DatabaseConn {
    /// Open a database at the specified path
    ///
    /// If the path is `None`, an in-memory database is created.
    pub fn open(path: Option<&str>) -> Result<Self> {
        Self::open_with_timeout(path, DEFAULT_BUSY_TIMEOUT)
    }

    /// Open a database with an explicit busy timeout
    pub fn open_with_timeout(path: Option<&str>, busy_timeout: Duration) -> Result<Self> {
        let conn = match path {
            Some(p) => Connection::open(p)
                .map_err(|e| anyhow!("Failed to open database at '{}': {}", p, e))?,
            None => Connection::open_in_memory()
                .map_err(|e| anyhow!("Failed to create in-memory database: {}", e))?,
        };

        let db = DatabaseConn { conn };
        db.configure(path.is_some(), busy_timeout)?;
        Ok(db)
    }

    /// Open a database at the specified path (convenience method)
    pub fn open_path(path: &str) -> Result<Self> {
        Self::open(Some(path))
    }

    /// Create an in-memory database
    pub fn open_in_memory() -> Result<Self> {
        Self::open(None)
    }

    fn configure(&self, file_backed: bool, busy_timeout: Duration) -> Result<()> {
        // WAL is meaningless for in-memory databases (SQLite reports "memory")
        if file_backed {
            let _: String = self
                .conn
                .query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))
                .map_err(|e| anyhow!("Failed to set journal mode: {}", e))?;
        }

        self.conn
            .busy_timeout(busy_timeout)
            .map_err(|e| anyhow!("Failed to set busy timeout: {}", e))?;

        self.conn
            .execute("PRAGMA foreign_keys=ON", [])
            .map_err(|e| anyhow!("Failed to enable foreign keys: {}", e))?;

        Ok(())
    }

    /// Execute a SQL statement
    pub fn execute(&self, sql: &str) -> Result<usize> {
        self.conn
            .execute(sql, [])
            .map_err(|e| anyhow!("Failed to execute SQL: {}", e))
    }

    /// Execute a SQL statement with parameters
    pub fn execute_with_params<P: rusqlite::Params>(&self, sql: &str, params: P) -> Result<usize> {
        self.conn
            .execute(sql, params)
            .map_err(|e| anyhow!("Failed to execute SQL with params: {}", e))
    }

    /// Begin an unchecked transaction
    ///
    /// The transaction rolls back when dropped without `commit()`.
    pub fn transaction(&self) -> Result<rusqlite::Transaction<'_>> {
        self.conn
            .unchecked_transaction()
            .map_err(|e| anyhow!("Failed to begin transaction: {}", e))
    }

    /// Check if a table exists in the database
    pub fn table_exists(&self, table_name: &str) -> Result<bool> {
        let count: i32 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                [table_name],
                |row| row.get(0),
            )
            .map_err(|e| anyhow!("Failed to check table existence: {}", e))?;
        Ok(count > 0)
    }

    /// Get the row count for a table
    pub fn table_count(&self, table_name: &str) -> Result<u64> {
        let query = format!("SELECT COUNT(*) FROM {}", quote_ident(table_name));
        let count: u64 = self
            .conn
            .query_row(&query, [], |row| row.get(0))
            .map_err(|e| anyhow!("Failed to get table count: {}", e))?;
        Ok(count)
    }

    /// List every user table present in the live database catalog
    ///
    /// SQLite's internal `sqlite_%` tables are excluded.
    pub fn list_tables(&self) -> Result<Vec<String>> {
        self.list_objects("table")
    }

    /// List every view present in the live database catalog
    pub fn list_views(&self) -> Result<Vec<String>> {
        self.list_objects("view")
    }

    fn list_objects(&self, kind: &str) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT name FROM sqlite_master \
                 WHERE type = ?1 AND name NOT LIKE 'sqlite_%' \
                 ORDER BY name",
            )
            .map_err(|e| anyhow!("Failed to prepare catalog query: {}", e))?;

        let names = stmt
            .query_map([kind], |row| row.get::<_, String>(0))
            .map_err(|e| anyhow!("Failed to query catalog: {}", e))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| anyhow!("Failed to read catalog row: {}", e))?;

        Ok(names)
    }

    /// Whether foreign key enforcement is currently on for this connection
    pub fn foreign_keys_enabled(&self) -> Result<bool> {
        let enabled: i32 = self
            .conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .map_err(|e| anyhow!("Failed to read foreign key setting: {}", e))?;
        Ok(enabled != 0)
    }

    fn set_foreign_keys(&self, enabled: bool) -> Result<()> {
        let sql = if enabled {
            "PRAGMA foreign_keys=ON"
        } else {
            "PRAGMA foreign_keys=OFF"
        };
        self.conn
            .execute(sql, [])
            .map_err(|e| anyhow!("Failed to change foreign key setting: {}", e))?;
        Ok(())
    }

    /// Disable foreign key enforcement until the returned guard is dropped
    ///
    /// Must be called outside a transaction; SQLite ignores the pragma
    /// while one is open.
    pub fn foreign_keys_off(&self) -> Result<ForeignKeysOff<'_>> {
        let previous = self.foreign_keys_enabled()?;
        self.set_foreign_keys(false)?;
        Ok(ForeignKeysOff { db: self, previous })
    }
}

/// Scope in which foreign key enforcement is disabled
///
/// The previous setting is restored on drop, whichever way the scope exits.
pub struct ForeignKeysOff<'a> {
    db: &'a DatabaseConn,
    previous: bool,
}

impl Drop for ForeignKeysOff<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.db.set_foreign_keys(self.previous) {
            debug!("could not restore foreign key setting: {}", e);
        }
    }
}

/// Quote an SQL identifier, doubling embedded quotes
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_in_memory() {
        let db = DatabaseConn::open_in_memory();
        assert!(db.is_ok());
    }

    #[test]
    fn test_open_file_backed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.sqlite3");
        let db = DatabaseConn::open_path(path.to_str().unwrap()).unwrap();
        db.execute("CREATE TABLE t (id INTEGER PRIMARY KEY)").unwrap();
        assert!(path.exists());
        assert!(db.table_exists("t").unwrap());
    }

    #[test]
    fn test_table_exists() {
        let db = DatabaseConn::open_in_memory().unwrap();
        db.execute("CREATE TABLE test_table (id INTEGER PRIMARY KEY)")
            .unwrap();

        assert!(db.table_exists("test_table").unwrap());
        assert!(!db.table_exists("nonexistent_table").unwrap());
    }

    #[test]
    fn test_table_count() {
        let db = DatabaseConn::open_in_memory().unwrap();
        db.execute("CREATE TABLE test_table (id INTEGER PRIMARY KEY)")
            .unwrap();
        db.execute("INSERT INTO test_table (id) VALUES (1), (2), (3)")
            .unwrap();

        assert_eq!(db.table_count("test_table").unwrap(), 3);
    }

    #[test]
    fn test_list_tables_skips_internal_tables() {
        let db = DatabaseConn::open_in_memory().unwrap();
        // AUTOINCREMENT creates sqlite_sequence behind the scenes
        db.execute("CREATE TABLE b (id INTEGER PRIMARY KEY AUTOINCREMENT)")
            .unwrap();
        db.execute("CREATE TABLE a (id INTEGER PRIMARY KEY)").unwrap();
        db.execute("CREATE VIEW v AS SELECT id FROM a").unwrap();

        assert_eq!(db.list_tables().unwrap(), vec!["a", "b"]);
        assert_eq!(db.list_views().unwrap(), vec!["v"]);
    }

    #[test]
    fn test_foreign_keys_guard_restores_setting() {
        let db = DatabaseConn::open_in_memory().unwrap();
        assert!(db.foreign_keys_enabled().unwrap());

        {
            let _guard = db.foreign_keys_off().unwrap();
            assert!(!db.foreign_keys_enabled().unwrap());
        }

        assert!(db.foreign_keys_enabled().unwrap());
    }

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("users"), "\"users\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }
}
