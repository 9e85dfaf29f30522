//! Error types for the migration runner.

use std::fmt;
use thiserror::Error;
use tm_core::CoreError;
use tm_db::DbError;

/// Step of a single migration's transaction that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyStage {
    /// Opening the transaction
    Begin,
    /// Taking the advisory lock
    Lock,
    /// Re-reading the ledger under the lock
    Recheck,
    /// Running the migration's SQL
    Execute,
    /// Inserting the ledger row
    Record,
    /// Committing
    Commit,
}

impl fmt::Display for ApplyStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ApplyStage::Begin => "begin transaction",
            ApplyStage::Lock => "acquire advisory lock",
            ApplyStage::Recheck => "check ledger",
            ApplyStage::Execute => "execute migration",
            ApplyStage::Record => "record migration",
            ApplyStage::Commit => "commit",
        };
        f.write_str(s)
    }
}

/// Migration run errors.
///
/// Setup and discovery errors happen before any migration is attempted.
/// Per-migration errors leave earlier migrations of the run committed.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Ledger table could not be created (M001)
    #[error("[M001] failed to ensure migrations table: {source}")]
    EnsureLedger { source: DbError },

    /// Ledger could not be read (M002)
    #[error("[M002] failed to retrieve applied migrations: {source}")]
    LoadApplied { source: DbError },

    /// Migration directory could not be listed (M003)
    #[error("[M003] failed to read migration directory: {source}")]
    ReadDirectory { source: CoreError },

    /// Migration body could not be read (M004)
    #[error("[M004] error reading migration file {filename}: {source}")]
    ReadFile { filename: String, source: CoreError },

    /// Migration transaction failed and was rolled back (M005)
    #[error("[M005] error applying migration {filename}: failed to {stage}: {source}")]
    Apply {
        filename: String,
        stage: ApplyStage,
        source: DbError,
    },
}

impl MigrateError {
    /// Migration the error is about, if any.
    pub fn filename(&self) -> Option<&str> {
        match self {
            MigrateError::ReadFile { filename, .. } | MigrateError::Apply { filename, .. } => {
                Some(filename)
            }
            _ => None,
        }
    }

    /// Failed transaction step, for per-migration database errors.
    pub fn stage(&self) -> Option<ApplyStage> {
        match self {
            MigrateError::Apply { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

/// Result type alias for [`MigrateError`].
pub type MigrateResult<T> = Result<T, MigrateError>;
