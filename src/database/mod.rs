//! Database module
//!
//! - **core**: connection wrapper, schema registry, persistence engine and
//!   the schema lifecycle manager
//! - **models**: the application's table definitions
//!
//! # Usage
//!
//! ```rust,ignore
//! use dbreset::database::{app_registry, DatabaseConn, SchemaLifecycle, SqliteEngine};
//!
//! let engine = SqliteEngine::new(DatabaseConn::open_path("app.sqlite3")?, app_registry()?);
//! let lifecycle = SchemaLifecycle::new(&engine);
//!
//! // test setup
//! lifecycle.reset()?;
//! ```

pub mod core;
pub mod models;

pub use self::core::{
    quote_ident, DatabaseConn, DropOutcome, DropReport, DropStrategy, ForeignKeysOff,
    PersistenceEngine, SchemaLifecycle, SchemaRegistry, SchemaStatus, SqliteEngine,
    TableDefinition, DEFAULT_BUSY_TIMEOUT,
};
pub use models::app_registry;

/// Open the application database at `path` with the application registry
pub fn open_app_engine(
    path: &str,
    busy_timeout: std::time::Duration,
) -> anyhow::Result<SqliteEngine> {
    let db = DatabaseConn::open_with_timeout(Some(path), busy_timeout)?;
    Ok(SqliteEngine::new(db, app_registry()?))
}

/// Ensure the directory holding the database file exists
pub fn ensure_parent_dir(path: &str) -> anyhow::Result<()> {
    if let Some(parent) = std::path::Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                anyhow::anyhow!("Failed to create directory '{}': {}", parent.display(), e)
            })?;
        }
    }
    Ok(())
}
