//! Schema lifecycle management
//!
//! [`SchemaLifecycle`] initializes, drops and resets the application schema
//! through a caller-owned [`PersistenceEngine`] handle.
//!
//! Dropping runs as two explicit strategy steps:
//!
//! 1. **Ordered**: the engine drops the registered tables children-first.
//! 2. **Cascade**: only if the ordered step could not complete. The live
//!    catalog is queried for every table (registered or not) and each one is
//!    dropped without regard to foreign key order.
//!
//! A failed cascade step is fatal and its error is returned to the caller.
//!
//! Callers must not mutate the schema concurrently with these operations.

use anyhow::Result;
use serde::Serialize;
use std::fmt;
use tracing::{error, info, warn};

use super::engine::PersistenceEngine;
use super::registry::SchemaRegistry;

/// Which drop strategy removed the schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DropStrategy {
    /// Registered tables dropped in dependency order
    Ordered,
    /// Catalog tables dropped with foreign keys ignored
    Cascade,
}

impl fmt::Display for DropStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropStrategy::Ordered => write!(f, "ordered"),
            DropStrategy::Cascade => write!(f, "cascade"),
        }
    }
}

/// Result of a single drop strategy step
#[derive(Debug)]
pub enum DropOutcome {
    /// The step removed the schema
    Dropped {
        strategy: DropStrategy,
        tables: usize,
    },
    /// The ordered step failed; the cascade step should run
    NeedsFallback { reason: anyhow::Error },
    /// The cascade step failed; nothing else can be tried
    Fatal { reason: anyhow::Error },
}

/// Summary of a completed drop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DropReport {
    pub strategy: DropStrategy,
    pub tables_dropped: usize,
}

/// Schema lifecycle manager
///
/// Borrows an engine handle; opening and closing the engine stays with the
/// caller (typically a test fixture or a maintenance command).
pub struct SchemaLifecycle<'a, E: PersistenceEngine> {
    engine: &'a E,
}

impl<'a, E: PersistenceEngine> SchemaLifecycle<'a, E> {
    /// Create a new lifecycle manager for the given engine
    pub fn new(engine: &'a E) -> Self {
        Self { engine }
    }

    /// Create all registered tables that do not exist yet
    ///
    /// Idempotent. Errors propagate unchanged.
    pub fn initialize(&self) -> Result<()> {
        self.engine.create_all()?;
        info!("Database tables created");
        Ok(())
    }

    /// Drop every table, falling back to a catalog-driven cascade drop
    /// when the ordered drop fails
    pub fn drop_schema(&self) -> Result<DropReport> {
        let outcome = match self.try_ordered_drop() {
            DropOutcome::NeedsFallback { reason } => {
                warn!("Ordered drop failed: {:#}. Trying cascade drop...", reason);
                self.try_cascade_drop()
            }
            other => other,
        };

        match outcome {
            DropOutcome::Dropped { strategy, tables } => Ok(DropReport {
                strategy,
                tables_dropped: tables,
            }),
            DropOutcome::Fatal { reason } => {
                error!("Failed to drop tables: {:#}", reason);
                Err(reason)
            }
            // try_cascade_drop never asks for another fallback
            DropOutcome::NeedsFallback { reason } => Err(reason),
        }
    }

    /// Drop then re-create the schema
    ///
    /// `initialize()` is not attempted when the drop fails.
    pub fn reset(&self) -> Result<DropReport> {
        info!("Resetting database...");
        let report = self.drop_schema()?;
        self.initialize()?;
        info!("Database reset complete");
        Ok(report)
    }

    /// Primary strategy: drop the registered tables in dependency order
    pub fn try_ordered_drop(&self) -> DropOutcome {
        match self.engine.drop_all() {
            Ok(tables) => {
                info!("Dropped {} registered tables in dependency order", tables);
                DropOutcome::Dropped {
                    strategy: DropStrategy::Ordered,
                    tables,
                }
            }
            Err(reason) => DropOutcome::NeedsFallback { reason },
        }
    }

    /// Fallback strategy: drop every table listed in the live catalog
    pub fn try_cascade_drop(&self) -> DropOutcome {
        let result = self
            .engine
            .list_tables()
            .and_then(|tables| self.engine.drop_tables_cascade(&tables));

        match result {
            Ok(tables) => {
                info!("Dropped {} tables using cascade", tables);
                DropOutcome::Dropped {
                    strategy: DropStrategy::Cascade,
                    tables,
                }
            }
            Err(reason) => DropOutcome::Fatal { reason },
        }
    }

    /// Compare the registry against the live catalog
    pub fn status(&self, registry: &SchemaRegistry) -> Result<SchemaStatus> {
        let live = self.engine.list_tables()?;

        let missing: Vec<String> = registry
            .table_names()
            .into_iter()
            .filter(|name| !live.iter().any(|t| t == name))
            .map(String::from)
            .collect();

        if missing.is_empty() {
            Ok(SchemaStatus::Current)
        } else if missing.len() == registry.len() {
            Ok(SchemaStatus::NotInitialized)
        } else {
            Ok(SchemaStatus::Partial { missing })
        }
    }

    /// Live tables the registry does not know about
    pub fn unregistered_tables(&self, registry: &SchemaRegistry) -> Result<Vec<String>> {
        let live = self.engine.list_tables()?;
        Ok(live
            .into_iter()
            .filter(|name| !registry.contains(name))
            .collect())
    }
}

/// Status of the database schema relative to the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SchemaStatus {
    /// None of the registered tables exist
    NotInitialized,

    /// Every registered table exists
    Current,

    /// Some registered tables are missing
    Partial { missing: Vec<String> },
}

impl fmt::Display for SchemaStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaStatus::NotInitialized => write!(f, "not initialized"),
            SchemaStatus::Current => write!(f, "current"),
            SchemaStatus::Partial { missing } => {
                write!(f, "partial (missing: {})", missing.join(", "))
            }
        }
    }
}
