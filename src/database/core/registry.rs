//! Schema registry
//!
//! The registry holds the table definitions the application's model layer
//! knows about. It owns no database state; the persistence engine reads it to
//! decide what to create and in which order to drop.

use anyhow::{anyhow, Result};

/// Definition of a single registered table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDefinition {
    pub name: String,
    /// `CREATE TABLE IF NOT EXISTS ...` statement
    pub create_sql: String,
    /// `CREATE INDEX IF NOT EXISTS ...` statements
    pub indexes: Vec<String>,
    /// Tables this table's foreign keys point to
    pub references: Vec<String>,
}

impl TableDefinition {
    pub fn new(name: &str, create_sql: &str) -> Self {
        Self {
            name: name.to_string(),
            create_sql: create_sql.to_string(),
            indexes: vec![],
            references: vec![],
        }
    }

    /// Declare a foreign key dependency on another table
    pub fn references(mut self, table: &str) -> Self {
        self.references.push(table.to_string());
        self
    }

    /// Add an index statement created alongside the table
    pub fn index(mut self, sql: &str) -> Self {
        self.indexes.push(sql.to_string());
        self
    }
}

/// The set of table definitions known to the application
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    tables: Vec<TableDefinition>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a table definition
    ///
    /// Fails if a table with the same name is already registered.
    pub fn register(&mut self, table: TableDefinition) -> Result<()> {
        if self.contains(&table.name) {
            return Err(anyhow!("Table '{}' is already registered", table.name));
        }
        self.tables.push(table);
        Ok(())
    }

    /// Builder-style variant of [`SchemaRegistry::register`]
    pub fn with_table(mut self, table: TableDefinition) -> Result<Self> {
        self.register(table)?;
        Ok(self)
    }

    pub fn tables(&self) -> &[TableDefinition] {
        &self.tables
    }

    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tables.iter().any(|t| t.name == name)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Tables ordered so every table comes after the tables it references
    ///
    /// Ties keep registration order. A reference to an unregistered table or
    /// a cycle between distinct tables cannot be ordered and is an error.
    pub fn creation_order(&self) -> Result<Vec<&TableDefinition>> {
        for table in &self.tables {
            for target in &table.references {
                if !self.contains(target) {
                    return Err(anyhow!(
                        "Table '{}' references unregistered table '{}'",
                        table.name,
                        target
                    ));
                }
            }
        }

        let mut ordered: Vec<&TableDefinition> = Vec::with_capacity(self.tables.len());
        let mut placed = vec![false; self.tables.len()];

        while ordered.len() < self.tables.len() {
            let next = self.tables.iter().enumerate().find(|(idx, table)| {
                !placed[*idx]
                    && table.references.iter().all(|target| {
                        *target == table.name || ordered.iter().any(|t| t.name == *target)
                    })
            });

            match next {
                Some((idx, table)) => {
                    placed[idx] = true;
                    ordered.push(table);
                }
                None => {
                    let stuck: Vec<&str> = self
                        .tables
                        .iter()
                        .enumerate()
                        .filter(|(idx, _)| !placed[*idx])
                        .map(|(_, t)| t.name.as_str())
                        .collect();
                    return Err(anyhow!(
                        "Circular foreign key dependency between tables: {}",
                        stuck.join(", ")
                    ));
                }
            }
        }

        Ok(ordered)
    }

    /// Tables ordered so every table is dropped before the tables it references
    pub fn drop_order(&self) -> Result<Vec<&TableDefinition>> {
        let mut order = self.creation_order()?;
        order.reverse();
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(name: &str) -> TableDefinition {
        TableDefinition::new(
            name,
            &format!("CREATE TABLE IF NOT EXISTS {} (id INTEGER PRIMARY KEY)", name),
        )
    }

    fn names(order: &[&TableDefinition]) -> Vec<String> {
        order.iter().map(|t| t.name.clone()).collect()
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut registry = SchemaRegistry::new();
        registry.register(table("users")).unwrap();
        assert!(registry.register(table("users")).is_err());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_parents_created_first() {
        // Registered child-first on purpose
        let registry = SchemaRegistry::new()
            .with_table(table("order_items").references("orders"))
            .unwrap()
            .with_table(table("orders").references("users"))
            .unwrap()
            .with_table(table("users"))
            .unwrap();

        let create = registry.creation_order().unwrap();
        assert_eq!(names(&create), vec!["users", "orders", "order_items"]);

        let drop = registry.drop_order().unwrap();
        assert_eq!(names(&drop), vec!["order_items", "orders", "users"]);
    }

    #[test]
    fn test_independent_tables_keep_registration_order() {
        let registry = SchemaRegistry::new()
            .with_table(table("b"))
            .unwrap()
            .with_table(table("a"))
            .unwrap();

        assert_eq!(names(&registry.creation_order().unwrap()), vec!["b", "a"]);
    }

    #[test]
    fn test_self_reference_is_ignored() {
        let registry = SchemaRegistry::new()
            .with_table(table("categories").references("categories"))
            .unwrap();

        assert_eq!(
            names(&registry.creation_order().unwrap()),
            vec!["categories"]
        );
    }

    #[test]
    fn test_unregistered_reference_is_an_error() {
        let registry = SchemaRegistry::new()
            .with_table(table("orders").references("users"))
            .unwrap();

        let err = registry.drop_order().unwrap_err();
        assert!(err.to_string().contains("unregistered table 'users'"));
    }

    #[test]
    fn test_cycle_is_an_error() {
        let registry = SchemaRegistry::new()
            .with_table(table("a").references("b"))
            .unwrap()
            .with_table(table("b").references("a"))
            .unwrap();

        let err = registry.creation_order().unwrap_err();
        assert!(err.to_string().contains("Circular"));
    }
}
