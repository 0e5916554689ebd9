//! Persistence engine contract
//!
//! The lifecycle manager only ever talks to the database through
//! [`PersistenceEngine`]. [`SqliteEngine`] is the production implementation,
//! pairing a [`DatabaseConn`] with the application's [`SchemaRegistry`].

use anyhow::{anyhow, Result};
use tracing::debug;

use super::connection::{quote_ident, DatabaseConn};
use super::registry::SchemaRegistry;

/// Operations the schema lifecycle needs from the persistence layer
pub trait PersistenceEngine {
    /// Create every registered table and its indexes if not already present
    fn create_all(&self) -> Result<()>;

    /// Drop every registered table, children before parents
    ///
    /// Returns the number of tables in the registry.
    fn drop_all(&self) -> Result<usize>;

    /// Names of the user tables in the live database catalog
    fn list_tables(&self) -> Result<Vec<String>>;

    /// Drop the named tables regardless of dependencies, then commit
    ///
    /// Missing tables are ignored. Returns the number of drop statements issued.
    fn drop_tables_cascade(&self, tables: &[String]) -> Result<usize>;
}

/// SQLite-backed persistence engine
pub struct SqliteEngine {
    db: DatabaseConn,
    registry: SchemaRegistry,
}

impl SqliteEngine {
    pub fn new(db: DatabaseConn, registry: SchemaRegistry) -> Self {
        Self { db, registry }
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Get the underlying database connection (for advanced queries)
    pub fn connection(&self) -> &DatabaseConn {
        &self.db
    }

    /// Release the engine, handing the connection back to the caller
    pub fn into_connection(self) -> DatabaseConn {
        self.db
    }
}

impl PersistenceEngine for SqliteEngine {
    fn create_all(&self) -> Result<()> {
        let order = self.registry.creation_order()?;

        let tx = self.db.transaction()?;
        for table in order {
            tx.execute(&table.create_sql, [])
                .map_err(|e| anyhow!("Failed to create table '{}': {}", table.name, e))?;

            for index_sql in &table.indexes {
                tx.execute(index_sql, []).map_err(|e| {
                    anyhow!("Failed to create index on '{}': {}", table.name, e)
                })?;
            }
        }
        tx.commit()
            .map_err(|e| anyhow!("Failed to commit table creation: {}", e))?;

        Ok(())
    }

    fn drop_all(&self) -> Result<usize> {
        let order = self.registry.drop_order()?;

        let tx = self.db.transaction()?;
        for table in &order {
            debug!("dropping table {}", table.name);
            tx.execute(
                &format!("DROP TABLE IF EXISTS {}", quote_ident(&table.name)),
                [],
            )
            .map_err(|e| anyhow!("Failed to drop table '{}': {}", table.name, e))?;
        }
        tx.commit()
            .map_err(|e| anyhow!("Failed to commit table drop: {}", e))?;

        Ok(order.len())
    }

    fn list_tables(&self) -> Result<Vec<String>> {
        self.db.list_tables()
    }

    fn drop_tables_cascade(&self, tables: &[String]) -> Result<usize> {
        // Enforcement must be switched off before the transaction begins
        let _fk_scope = self.db.foreign_keys_off()?;

        // Views depend on the tables being removed; clear them in the same scope
        let views = self.db.list_views()?;

        let tx = self.db.transaction()?;
        for view in &views {
            debug!("dropping view {}", view);
            tx.execute(&format!("DROP VIEW IF EXISTS {}", quote_ident(view)), [])
                .map_err(|e| anyhow!("Failed to drop view '{}': {}", view, e))?;
        }
        for table in tables {
            debug!("dropping table {} (cascade)", table);
            tx.execute(&format!("DROP TABLE IF EXISTS {}", quote_ident(table)), [])
                .map_err(|e| anyhow!("Failed to drop table '{}': {}", table, e))?;
        }
        tx.commit()
            .map_err(|e| anyhow!("Failed to commit cascade drop: {}", e))?;

        Ok(tables.len())
    }
}
