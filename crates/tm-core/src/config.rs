//! Configuration types and parsing for tidemark.yml

use crate::error::{CoreError, CoreResult};
use crate::ledger_table::LedgerTable;
use crate::lock_key::LockKey;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default directory holding migration files, relative to the project root
const DEFAULT_MIGRATIONS_DIR: &str = "migrations";

/// Default DuckDB database file
const DEFAULT_DB_PATH: &str = "tidemark.duckdb";

/// Config file names probed by [`Config::load_from_dir`], in order
const CONFIG_FILE_NAMES: &[&str] = &["tidemark.yml", "tidemark.yaml"];

/// Main project configuration from tidemark.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Directory containing migration SQL files
    #[serde(default = "default_migrations_dir")]
    pub migrations_dir: String,

    /// Table recording applied migrations
    #[serde(default)]
    pub ledger_table: LedgerTable,

    /// Advisory lock key shared by all runners of this project
    #[serde(default)]
    pub lock_key: LockKey,

    /// Database connection configuration
    #[serde(default)]
    pub database: DatabaseConfig,
}

/// Database type selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DbType {
    /// DuckDB (default)
    #[default]
    DuckDb,
    /// PostgreSQL
    Postgres,
}

impl std::fmt::Display for DbType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DbType::DuckDb => write!(f, "duckdb"),
            DbType::Postgres => write!(f, "postgres"),
        }
    }
}

/// Database connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Database type (duckdb or postgres)
    #[serde(rename = "type", default)]
    pub db_type: DbType,

    /// Database path (for DuckDB file-based or :memory:)
    #[serde(default = "default_db_path")]
    pub path: String,

    /// Connection URL (required for postgres)
    #[serde(default)]
    pub url: Option<String>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            db_type: DbType::default(),
            path: default_db_path(),
            url: None,
        }
    }
}

impl DatabaseConfig {
    /// Build a connection config from a single URL or path.
    ///
    /// `postgres://` and `postgresql://` URLs select PostgreSQL; anything else
    /// is treated as a DuckDB path (including `:memory:`).
    pub fn from_url(url: &str) -> Self {
        if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            Self {
                db_type: DbType::Postgres,
                path: default_db_path(),
                url: Some(url.to_string()),
            }
        } else {
            Self {
                db_type: DbType::DuckDb,
                path: url.to_string(),
                url: None,
            }
        }
    }
}

fn default_migrations_dir() -> String {
    DEFAULT_MIGRATIONS_DIR.to_string()
}

fn default_db_path() -> String {
    DEFAULT_DB_PATH.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            migrations_dir: default_migrations_dir(),
            ledger_table: LedgerTable::default(),
            lock_key: LockKey::default(),
            database: DatabaseConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Config =
            serde_yaml::from_str(&content).map_err(|e| CoreError::ConfigParseError {
                path: path.display().to_string(),
                source: e,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a project directory.
    ///
    /// Looks for tidemark.yml or tidemark.yaml and falls back to defaults
    /// when neither exists.
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        match CONFIG_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.exists())
        {
            Some(path) => Self::load(&path),
            None => {
                log::debug!("No tidemark config in {}, using defaults", dir.display());
                Ok(Self::default())
            }
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> CoreResult<()> {
        if self.migrations_dir.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "migrations_dir cannot be empty".to_string(),
            });
        }

        match self.database.db_type {
            DbType::Postgres if self.database.url.as_deref().map_or(true, str::is_empty) => {
                Err(CoreError::ConfigInvalid {
                    message: "database.url is required when database.type is postgres"
                        .to_string(),
                })
            }
            DbType::DuckDb if self.database.path.is_empty() => Err(CoreError::ConfigInvalid {
                message: "database.path cannot be empty for duckdb".to_string(),
            }),
            _ => Ok(()),
        }
    }

    /// Resolve the migrations directory against the project root
    pub fn migrations_dir_absolute(&self, root: &Path) -> PathBuf {
        let dir = Path::new(&self.migrations_dir);
        if dir.is_absolute() {
            dir.to_path_buf()
        } else {
            root.join(dir)
        }
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
