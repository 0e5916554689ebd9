#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

//! dbreset - schema lifecycle utilities for an application database
//!
//! dbreset initializes, drops and resets the tables of a SQLite-backed web
//! application. It is meant for test fixtures and maintenance scripts that
//! need a clean schema between runs.
//!
//! # Feature Flags
//!
//! | Feature | Description | Key Dependencies |
//! |---------|-------------|------------------|
//! | (none) | Library: engine, registry and lifecycle manager | `rusqlite` |
//! | `cli` | The `dbreset` command-line tool | `clap`, `tabled`, `tracing-subscriber` |
//!
//! ```toml
//! # Library only
//! dbreset = { version = "0.1", default-features = false }
//! ```
//!
//! # Architecture
//!
//! - **[`database`]**: all database functionality
//!   - `core`: connection wrapper, schema registry, persistence engine and
//!     [`SchemaLifecycle`]
//!   - `models`: the application's table definitions
//! - **[`config`]**: configuration management
//! - **[`output`]**: output formats for the command-line tool
//!
//! # Dropping the schema
//!
//! [`SchemaLifecycle::drop_schema`] first drops the registered tables in
//! foreign key order. If that fails (for example because a table created
//! outside the registry still references a registered one), every table in
//! the live catalog is dropped with foreign key enforcement switched off.
//! Only a failure of that second step is returned as an error.
//!
//! ```rust,ignore
//! use dbreset::database::{app_registry, DatabaseConn, SchemaLifecycle, SqliteEngine};
//!
//! let engine = SqliteEngine::new(DatabaseConn::open_in_memory()?, app_registry()?);
//! let lifecycle = SchemaLifecycle::new(&engine);
//!
//! lifecycle.initialize()?;
//! let report = lifecycle.reset()?;
//! println!("dropped {} tables ({})", report.tables_dropped, report.strategy);
//! ```

pub mod config;
pub mod database;
pub mod output;

pub use config::DbResetConfig;

pub use database::{
    app_registry, DatabaseConn, DropOutcome, DropReport, DropStrategy, PersistenceEngine,
    SchemaLifecycle, SchemaRegistry, SchemaStatus, SqliteEngine, TableDefinition,
};
