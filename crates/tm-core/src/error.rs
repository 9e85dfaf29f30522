//! Error types for tm-core

use thiserror::Error;

/// Core error type for Tidemark
#[derive(Error, Debug)]
pub enum CoreError {
    /// E001: Configuration file not found
    #[error("[E001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// E002: Failed to parse configuration file
    #[error("[E002] Failed to parse config {path}: {source}")]
    ConfigParseError {
        path: String,
        source: serde_yaml::Error,
    },

    /// E003: Invalid configuration value
    #[error("[E003] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// E004: Ledger table name rejected by the identifier grammar
    #[error("[E004] Invalid ledger table name '{name}': {reason}")]
    InvalidLedgerTable { name: String, reason: String },

    /// E005: Migration directory could not be listed
    #[error("[E005] Failed to read migration directory '{path}': {source}")]
    MigrationDirRead {
        path: String,
        source: std::io::Error,
    },

    /// E006: Migration file could not be read
    #[error("[E006] Failed to read migration file '{path}': {source}")]
    MigrationFileRead {
        path: String,
        source: std::io::Error,
    },

    /// E007: IO error with file path context
    #[error("[E007] Failed to read '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
