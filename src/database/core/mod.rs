//! Core database infrastructure
//!
//! This module provides the foundational database components:
//! - `DatabaseConn`: Core SQLite connection wrapper with configuration
//! - `SchemaRegistry`: Table definitions known to the application
//! - `PersistenceEngine`: The engine contract, implemented by `SqliteEngine`
//! - `SchemaLifecycle`: Schema initialization, drop and reset

mod connection;
mod engine;
mod registry;
mod schema;

pub use connection::{quote_ident, DatabaseConn, ForeignKeysOff, DEFAULT_BUSY_TIMEOUT};
pub use engine::{PersistenceEngine, SqliteEngine};
pub use registry::{SchemaRegistry, TableDefinition};
pub use schema::{DropOutcome, DropReport, DropStrategy, SchemaLifecycle, SchemaStatus};
