//! DuckDB database backend implementation

use crate::advisory::{AdvisoryGuard, AdvisoryLocks};
use crate::error::{DbError, DbResult};
use crate::traits::{Database, DbTransaction, LedgerEntry};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use duckdb::Connection;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tm_core::sql_utils::{escape_sql_string, quote_qualified};
use tm_core::{LedgerTable, LockKey};

/// Layout of `CAST(TIMESTAMP AS VARCHAR)` in DuckDB
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// DuckDB database backend
pub struct DuckDbBackend {
    conn: Mutex<Connection>,
    locks: Arc<AdvisoryLocks>,
}

impl DuckDbBackend {
    /// Create a new in-memory DuckDB connection
    pub fn in_memory() -> DbResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self::with_connection(conn))
    }

    /// Create a new DuckDB connection from a file path
    pub fn from_path(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path)
            .map_err(|e| DbError::ConnectionError(format!("{e}: {}", path.display())))?;
        Ok(Self::with_connection(conn))
    }

    /// Create from path string (handles :memory: special case)
    pub fn new(path: &str) -> DbResult<Self> {
        if path == ":memory:" {
            Self::in_memory()
        } else {
            Self::from_path(Path::new(path))
        }
    }

    fn with_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
            locks: Arc::new(AdvisoryLocks::new()),
        }
    }

    /// Open another connection to the same database.
    ///
    /// The clone shares this backend's advisory locks, so runners built on
    /// different clones exclude each other like separate processes would on
    /// PostgreSQL.
    pub fn try_clone(&self) -> DbResult<Self> {
        let conn = self.connection()?.try_clone()?;
        Ok(Self {
            conn: Mutex::new(conn),
            locks: Arc::clone(&self.locks),
        })
    }

    fn connection(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))
    }

    /// Execute batch SQL outside any migration transaction
    pub fn execute_batch(&self, sql: &str) -> DbResult<()> {
        let conn = self.connection()?;
        conn.execute_batch(sql)
            .map_err(|e| DbError::ExecutionError(e.to_string()))
    }

    /// Number of rows produced by `sql`
    pub fn query_count(&self, sql: &str) -> DbResult<usize> {
        let conn = self.connection()?;
        let count: i64 = conn
            .query_row(&format!("SELECT COUNT(*) FROM ({})", sql), [], |row| {
                row.get(0)
            })
            .map_err(|e| DbError::ExecutionError(e.to_string()))?;
        Ok(count as usize)
    }

    /// Check if a table or view exists (optionally `schema.name`)
    pub fn relation_exists(&self, name: &str) -> DbResult<bool> {
        let conn = self.connection()?;
        let (schema, table) = match name.rsplit_once('.') {
            Some((schema, table)) => (schema, table),
            None => ("main", name),
        };
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM information_schema.tables WHERE table_schema = ? AND table_name = ?",
            duckdb::params![schema, table],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn applied_filenames_sync(&self, ledger: &LedgerTable) -> DbResult<BTreeSet<String>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(&format!("SELECT filename FROM {}", ledger.quoted()))?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut applied = BTreeSet::new();
        for filename in rows {
            applied.insert(filename?);
        }
        Ok(applied)
    }

    fn ledger_entries_sync(&self, ledger: &LedgerTable) -> DbResult<Vec<LedgerEntry>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT id, filename, CAST(applied_at AS VARCHAR) FROM {} ORDER BY filename",
            ledger.quoted()
        ))?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
            ))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (id, filename, applied_at) = row?;
            let applied_at = applied_at
                .map(|s| {
                    NaiveDateTime::parse_from_str(&s, TIMESTAMP_FORMAT).map_err(|e| {
                        DbError::DecodeError {
                            column: "applied_at".to_string(),
                            message: format!("{e}: {s}"),
                        }
                    })
                })
                .transpose()?;
            entries.push(LedgerEntry {
                id,
                filename,
                applied_at,
            });
        }
        Ok(entries)
    }
}

#[async_trait]
impl Database for DuckDbBackend {
    async fn begin(&self) -> DbResult<Box<dyn DbTransaction + '_>> {
        let conn = self.connection()?.try_clone()?;
        Ok(Box::new(DuckDbTransaction {
            conn,
            locks: Arc::clone(&self.locks),
            guard: None,
            open: false,
            finished: false,
        }))
    }

    async fn applied_filenames(&self, ledger: &LedgerTable) -> DbResult<BTreeSet<String>> {
        self.applied_filenames_sync(ledger)
    }

    async fn ledger_entries(&self, ledger: &LedgerTable) -> DbResult<Vec<LedgerEntry>> {
        self.ledger_entries_sync(ledger)
    }

    fn db_type(&self) -> &'static str {
        "duckdb"
    }
}

/// Transaction on a dedicated DuckDB connection.
///
/// `BEGIN` is deferred until the first statement. DuckDB fixes a
/// transaction's snapshot when it begins, so taking the advisory lock first
/// guarantees the transaction sees everything its predecessor committed.
pub struct DuckDbTransaction {
    conn: Connection,
    locks: Arc<AdvisoryLocks>,
    guard: Option<AdvisoryGuard>,
    open: bool,
    finished: bool,
}

impl DuckDbTransaction {
    fn ensure_open(&mut self) -> DbResult<()> {
        if !self.open {
            self.conn
                .execute_batch("BEGIN TRANSACTION")
                .map_err(|e| DbError::TransactionError(format!("BEGIN failed: {e}")))?;
            self.open = true;
        }
        Ok(())
    }
}

#[async_trait]
impl DbTransaction for DuckDbTransaction {
    async fn advisory_lock(&mut self, key: LockKey) -> DbResult<()> {
        if self.guard.is_none() {
            let locks = Arc::clone(&self.locks);
            self.guard = Some(locks.acquire(key).await?);
            log::debug!("Acquired advisory lock {key}");
        }
        Ok(())
    }

    async fn create_ledger(&mut self, ledger: &LedgerTable) -> DbResult<()> {
        self.ensure_open()?;
        let sequence = ledger.companion("id_seq");
        self.conn.execute_batch(&format!(
            "CREATE SEQUENCE IF NOT EXISTS {seq};
             CREATE TABLE IF NOT EXISTS {table} (
                 id         BIGINT PRIMARY KEY DEFAULT nextval('{seq_literal}'),
                 filename   VARCHAR UNIQUE NOT NULL,
                 applied_at TIMESTAMP DEFAULT now()
             );",
            seq = quote_qualified(&sequence),
            seq_literal = escape_sql_string(&sequence),
            table = ledger.quoted(),
        ))?;
        Ok(())
    }

    async fn is_recorded(&mut self, ledger: &LedgerTable, filename: &str) -> DbResult<bool> {
        self.ensure_open()?;
        let count: i64 = self.conn.query_row(
            &format!(
                "SELECT COUNT(*) FROM {} WHERE filename = ?",
                ledger.quoted()
            ),
            duckdb::params![filename],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    async fn execute_batch(&mut self, sql: &str) -> DbResult<()> {
        self.ensure_open()?;
        self.conn.execute_batch(sql)?;
        Ok(())
    }

    async fn record(&mut self, ledger: &LedgerTable, filename: &str) -> DbResult<()> {
        self.ensure_open()?;
        self.conn.execute(
            &format!("INSERT INTO {} (filename) VALUES (?)", ledger.quoted()),
            duckdb::params![filename],
        )?;
        Ok(())
    }

    async fn commit(mut self: Box<Self>) -> DbResult<()> {
        if self.open {
            if let Err(commit_err) = self.conn.execute_batch("COMMIT") {
                // Drop issues the ROLLBACK
                return Err(DbError::TransactionError(format!(
                    "COMMIT failed: {commit_err}"
                )));
            }
        }
        self.finished = true;
        Ok(())
    }
}

impl Drop for DuckDbTransaction {
    fn drop(&mut self) {
        if self.open && !self.finished {
            if let Err(e) = self.conn.execute_batch("ROLLBACK") {
                log::warn!("DuckDB rollback failed: {e}");
            } else {
                log::debug!("Rolled back uncommitted DuckDB transaction");
            }
        }
    }
}

#[cfg(test)]
#[path = "duckdb_test.rs"]
mod tests;
