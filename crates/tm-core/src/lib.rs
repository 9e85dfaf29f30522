//! tm-core - Core library for Tidemark
//!
//! This crate provides the shared types used across all Tidemark components:
//! project configuration, the validated ledger table name, the advisory lock
//! key, and discovery of migration files on disk.

pub mod config;
pub mod error;
pub mod ledger_table;
pub mod lock_key;
pub mod migration_file;
pub mod sql_utils;

pub use config::{Config, DatabaseConfig, DbType};
pub use error::{CoreError, CoreResult};
pub use ledger_table::LedgerTable;
pub use lock_key::LockKey;
pub use migration_file::{discover_migrations, MigrationFile, MIGRATION_SUFFIX};
