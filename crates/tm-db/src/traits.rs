//! Database trait definitions

use crate::error::DbResult;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::BTreeSet;
use tm_core::{LedgerTable, LockKey};

/// One row of the ledger table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerEntry {
    /// Surrogate key
    pub id: i64,

    /// Migration filename, unique within the ledger
    pub filename: String,

    /// When the row was inserted
    pub applied_at: Option<NaiveDateTime>,
}

/// Database abstraction trait for Tidemark
///
/// Implementations must be Send + Sync for async operation.
#[async_trait]
pub trait Database: Send + Sync {
    /// Start a transaction.
    ///
    /// The returned handle rolls back when dropped without
    /// [`DbTransaction::commit`], on every exit path.
    async fn begin(&self) -> DbResult<Box<dyn DbTransaction + '_>>;

    /// All filenames recorded in the ledger. Takes no lock.
    async fn applied_filenames(&self, ledger: &LedgerTable) -> DbResult<BTreeSet<String>>;

    /// All ledger rows ordered by filename.
    async fn ledger_entries(&self, ledger: &LedgerTable) -> DbResult<Vec<LedgerEntry>>;

    /// Database type identifier for logging
    fn db_type(&self) -> &'static str;
}

/// A single open transaction.
#[async_trait]
pub trait DbTransaction: Send {
    /// Take the transaction-scoped advisory lock for `key`, waiting for the
    /// current holder to finish. Released at commit or rollback.
    async fn advisory_lock(&mut self, key: LockKey) -> DbResult<()>;

    /// Create the ledger table if it does not exist yet.
    async fn create_ledger(&mut self, ledger: &LedgerTable) -> DbResult<()>;

    /// Whether `filename` is recorded, as seen from inside this transaction.
    async fn is_recorded(&mut self, ledger: &LedgerTable, filename: &str) -> DbResult<bool>;

    /// Execute one or more SQL statements.
    async fn execute_batch(&mut self, sql: &str) -> DbResult<()>;

    /// Insert a ledger row for `filename`.
    async fn record(&mut self, ledger: &LedgerTable, filename: &str) -> DbResult<()>;

    /// Commit the transaction.
    async fn commit(self: Box<Self>) -> DbResult<()>;
}
