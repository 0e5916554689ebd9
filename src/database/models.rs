//! Application model registry
//!
//! Table definitions for the calculator web application: registered users
//! and the calculations they own.

use anyhow::Result;

use crate::database::core::{SchemaRegistry, TableDefinition};

pub const USERS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL UNIQUE,
        email TEXT NOT NULL UNIQUE,
        first_name TEXT NOT NULL,
        last_name TEXT NOT NULL,
        password_hash TEXT NOT NULL,
        is_active INTEGER NOT NULL DEFAULT 1,
        is_verified INTEGER NOT NULL DEFAULT 0,
        created_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now')),
        updated_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now')),
        last_login INTEGER
    );
"#;

pub const USERS_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_users_username ON users(username)",
    "CREATE INDEX IF NOT EXISTS idx_users_email ON users(email)",
];

pub const CALCULATIONS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS calculations (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        calculation_type TEXT NOT NULL,
        inputs TEXT NOT NULL,
        result REAL,
        created_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now')),
        updated_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
    );
"#;

pub const CALCULATIONS_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_calculations_user_id ON calculations(user_id)",
    "CREATE INDEX IF NOT EXISTS idx_calculations_type ON calculations(calculation_type)",
];

/// Build the registry of every table the application defines
pub fn app_registry() -> Result<SchemaRegistry> {
    let mut users = TableDefinition::new("users", USERS_TABLE);
    for sql in USERS_INDEXES {
        users = users.index(sql);
    }

    let mut calculations =
        TableDefinition::new("calculations", CALCULATIONS_TABLE).references("users");
    for sql in CALCULATIONS_INDEXES {
        calculations = calculations.index(sql);
    }

    SchemaRegistry::new()
        .with_table(users)?
        .with_table(calculations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::core::{DatabaseConn, PersistenceEngine, SchemaLifecycle, SqliteEngine};

    fn create_app_engine() -> SqliteEngine {
        SqliteEngine::new(
            DatabaseConn::open_in_memory().unwrap(),
            app_registry().unwrap(),
        )
    }

    #[test]
    fn test_app_registry_order() {
        let registry = app_registry().unwrap();
        let order: Vec<&str> = registry
            .drop_order()
            .unwrap()
            .iter()
            .map(|t| t.name.as_str())
            .collect();
        assert_eq!(order, vec!["calculations", "users"]);
    }

    #[test]
    fn test_app_schema_lifecycle() {
        let engine = create_app_engine();
        let lifecycle = SchemaLifecycle::new(&engine);
        lifecycle.initialize().unwrap();

        let db = engine.connection();
        db.execute(
            "INSERT INTO users (username, email, first_name, last_name, password_hash)
             VALUES ('testuser_1234', 'testuser_1234@example.com', 'Test', 'User', 'x')",
        )
        .unwrap();
        db.execute(
            "INSERT INTO calculations (user_id, calculation_type, inputs, result)
             VALUES (1, 'addition', '[1, 2]', 3.0)",
        )
        .unwrap();

        // sqlite_sequence from AUTOINCREMENT is never listed
        assert_eq!(engine.list_tables().unwrap(), vec!["calculations", "users"]);

        lifecycle.reset().unwrap();
        assert_eq!(db.table_count("users").unwrap(), 0);
        assert_eq!(db.table_count("calculations").unwrap(), 0);
    }

    #[test]
    fn test_duplicate_username_rejected() {
        let engine = create_app_engine();
        SchemaLifecycle::new(&engine).initialize().unwrap();

        let insert = "INSERT INTO users (username, email, first_name, last_name, password_hash)
                      VALUES ('dup', ?1, 'A', 'B', 'x')";
        engine
            .connection()
            .execute_with_params(insert, ["a@example.com"])
            .unwrap();
        assert!(engine
            .connection()
            .execute_with_params(insert, ["b@example.com"])
            .is_err());
    }
}
