use anyhow::{anyhow, Result};
use config::Config;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize)]
pub struct DbResetConfig {
    /// Path to the SQLite database file holding the application schema
    pub database_path: String,

    /// How long to wait on a locked database, in milliseconds (default: 5000)
    pub busy_timeout_ms: u64,
}

const EMPTY_CONFIG: &str = r#"### dbreset configuration file

### SQLite database holding the application schema
# database_path = "~/.dbreset/app.sqlite3"

### wait this long on a locked database before failing (milliseconds)
# busy_timeout_ms = 5000
"#;

const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5000;

fn home_dir_string() -> Result<String> {
    let home = dirs::home_dir().ok_or_else(|| anyhow!("Could not find home directory"))?;
    home.to_str()
        .map(|s| s.to_owned())
        .ok_or_else(|| anyhow!("Could not convert home directory path to string"))
}

impl Default for DbResetConfig {
    fn default() -> Self {
        let home_dir = dirs::home_dir()
            .map(|h| h.to_string_lossy().to_string())
            .unwrap_or_else(|| ".".to_string());

        Self {
            database_path: format!("{}/.dbreset/app.sqlite3", home_dir),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }
}

impl DbResetConfig {
    /// Create and initialize a new configuration
    ///
    /// Reads the TOML file at `path` (or `$HOME/.dbreset/dbreset.toml`),
    /// writing a commented template when it does not exist yet, then applies
    /// `DBRESET_*` environment overrides.
    pub fn new(path: &Option<String>) -> Result<DbResetConfig> {
        let mut builder = Config::builder();

        let home_dir = home_dir_string()?;
        let dbreset_dir = format!("{}/.dbreset", home_dir.as_str());

        match path {
            Some(p) => {
                let path = Path::new(p.as_str());
                if path.exists() {
                    let path_str = path
                        .to_str()
                        .ok_or_else(|| anyhow!("Could not convert path to string"))?;
                    builder = builder.add_source(config::File::with_name(path_str));
                } else {
                    std::fs::write(p.as_str(), EMPTY_CONFIG)
                        .map_err(|e| anyhow!("Unable to create config file: {}", e))?;
                }
            }
            None => {
                std::fs::create_dir_all(dbreset_dir.as_str())
                    .map_err(|e| anyhow!("Unable to create dbreset directory: {}", e))?;
                let p = format!("{}/dbreset.toml", dbreset_dir.as_str());
                if Path::new(p.as_str()).exists() {
                    builder = builder.add_source(config::File::with_name(p.as_str()));
                } else {
                    std::fs::write(p.as_str(), EMPTY_CONFIG).map_err(|e| {
                        anyhow!("Unable to create config file {}: {}", p.as_str(), e)
                    })?;
                }
            }
        }

        // E.g., `DBRESET_DATABASE_PATH=/tmp/test.sqlite3 dbreset reset --yes`
        builder = builder.add_source(config::Environment::with_prefix("DBRESET"));

        let settings = builder
            .build()
            .map_err(|e| anyhow!("Failed to build configuration: {}", e))?;

        let config = settings
            .try_deserialize::<HashMap<String, String>>()
            .map_err(|e| anyhow!("Failed to deserialize configuration: {}", e))?;

        Self::from_map(&config, &home_dir)
    }

    fn from_map(config: &HashMap<String, String>, home_dir: &str) -> Result<DbResetConfig> {
        let database_path = match config.get("database_path") {
            Some(p) => expand_home(p, home_dir),
            None => format!("{}/.dbreset/app.sqlite3", home_dir),
        };

        let busy_timeout_ms = match config.get("busy_timeout_ms") {
            Some(s) => s
                .parse()
                .map_err(|e| anyhow!("Invalid busy_timeout_ms '{}': {}", s, e))?,
            None => DEFAULT_BUSY_TIMEOUT_MS,
        };

        Ok(DbResetConfig {
            database_path,
            busy_timeout_ms,
        })
    }

    /// Busy timeout as Duration
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    /// Display configuration summary
    pub fn summary(&self) -> String {
        let mut lines = vec![
            format!("Config File:        {}", Self::config_file_path()),
            format!("Database Path:      {}", self.database_path),
            format!("Busy Timeout:       {} ms", self.busy_timeout_ms),
        ];

        if Path::new(&self.database_path).exists() {
            lines.push("Database Status:    exists".to_string());
        } else {
            lines.push("Database Status:    not created".to_string());
        }

        lines.join("\n")
    }

    /// Get the default config file path
    pub fn config_file_path() -> String {
        let home_dir = dirs::home_dir()
            .map(|h| h.to_string_lossy().to_string())
            .unwrap_or_else(|| "~".to_string());
        format!("{}/.dbreset/dbreset.toml", home_dir)
    }
}

fn expand_home(path: &str, home_dir: &str) -> String {
    match path.strip_prefix("~/") {
        Some(rest) => format!("{}/{}", home_dir.trim_end_matches('/'), rest),
        None if path == "~" => home_dir.to_string(),
        None => path.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_map() {
        let config = DbResetConfig::from_map(&HashMap::new(), "/home/tester").unwrap();
        assert_eq!(config.database_path, "/home/tester/.dbreset/app.sqlite3");
        assert_eq!(config.busy_timeout(), Duration::from_millis(5000));
    }

    #[test]
    fn test_values_from_map() {
        let mut map = HashMap::new();
        map.insert("database_path".to_string(), "~/data/app.db".to_string());
        map.insert("busy_timeout_ms".to_string(), "250".to_string());

        let config = DbResetConfig::from_map(&map, "/home/tester/").unwrap();
        assert_eq!(config.database_path, "/home/tester/data/app.db");
        assert_eq!(config.busy_timeout_ms, 250);
    }

    #[test]
    fn test_invalid_timeout_rejected() {
        let mut map = HashMap::new();
        map.insert("busy_timeout_ms".to_string(), "soon".to_string());
        assert!(DbResetConfig::from_map(&map, "/home/tester").is_err());
    }

    #[test]
    fn test_config_file_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dbreset.toml");
        std::fs::write(
            &path,
            "database_path = \"/tmp/dbreset-test.sqlite3\"\nbusy_timeout_ms = 100\n",
        )
        .unwrap();

        let config = DbResetConfig::new(&Some(path.to_string_lossy().to_string())).unwrap();
        assert_eq!(config.database_path, "/tmp/dbreset-test.sqlite3");
        assert_eq!(config.busy_timeout_ms, 100);
    }

    #[test]
    fn test_missing_config_file_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("new.toml");

        DbResetConfig::new(&Some(path.to_string_lossy().to_string())).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("### dbreset configuration file"));
    }
}
