//! Applied/pending view of a migration directory against the ledger.

use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tm_core::MigrationFile;
use tm_db::LedgerEntry;

/// State of one migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MigrationState {
    /// File exists and is recorded in the ledger
    Applied,
    /// File exists but is not recorded
    Pending,
    /// Recorded in the ledger but no longer present in the directory
    Missing,
}

impl fmt::Display for MigrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MigrationState::Applied => write!(f, "applied"),
            MigrationState::Pending => write!(f, "pending"),
            MigrationState::Missing => write!(f, "missing"),
        }
    }
}

/// One row of `tidemark status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationStatus {
    pub filename: String,
    pub state: MigrationState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applied_at: Option<NaiveDateTime>,
}

/// Merge discovered files with ledger rows, ordered by filename.
pub(crate) fn merge_status(
    files: &[MigrationFile],
    entries: Vec<LedgerEntry>,
) -> Vec<MigrationStatus> {
    let mut recorded: BTreeMap<String, Option<NaiveDateTime>> = entries
        .into_iter()
        .map(|e| (e.filename, e.applied_at))
        .collect();

    let mut rows: BTreeMap<String, MigrationStatus> = BTreeMap::new();
    for file in files {
        let status = match recorded.remove(&file.filename) {
            Some(applied_at) => MigrationStatus {
                filename: file.filename.clone(),
                state: MigrationState::Applied,
                applied_at,
            },
            None => MigrationStatus {
                filename: file.filename.clone(),
                state: MigrationState::Pending,
                applied_at: None,
            },
        };
        rows.insert(file.filename.clone(), status);
    }

    for (filename, applied_at) in recorded {
        rows.insert(
            filename.clone(),
            MigrationStatus {
                filename,
                state: MigrationState::Missing,
                applied_at,
            },
        );
    }

    rows.into_values().collect()
}
