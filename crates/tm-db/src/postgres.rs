//! PostgreSQL database backend implementation

use crate::error::{DbError, DbResult};
use crate::traits::{Database, DbTransaction, LedgerEntry};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Executor, Postgres};
use std::collections::BTreeSet;
use tm_core::{LedgerTable, LockKey};

/// PostgreSQL database backend
pub struct PostgresBackend {
    pool: PgPool,
}

impl PostgresBackend {
    /// Connect to the database at `url`.
    ///
    /// The runner needs at most one connection for the ledger read and one
    /// for the open migration transaction.
    pub async fn connect(url: &str) -> DbResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .connect(url)
            .await
            .map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self { pool })
    }

    /// Wrap an existing pool
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Borrow the underlying pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Database for PostgresBackend {
    async fn begin(&self) -> DbResult<Box<dyn DbTransaction + '_>> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionError(format!("BEGIN failed: {e}")))?;
        Ok(Box::new(PostgresTransaction { tx }))
    }

    async fn applied_filenames(&self, ledger: &LedgerTable) -> DbResult<BTreeSet<String>> {
        let sql = format!("SELECT filename FROM {}", ledger.quoted());
        let filenames = sqlx::query_scalar::<_, String>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(filenames.into_iter().collect())
    }

    async fn ledger_entries(&self, ledger: &LedgerTable) -> DbResult<Vec<LedgerEntry>> {
        let sql = format!(
            "SELECT CAST(id AS BIGINT), filename, applied_at FROM {} ORDER BY filename",
            ledger.quoted()
        );
        let rows = sqlx::query_as::<_, (i64, String, Option<NaiveDateTime>)>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(id, filename, applied_at)| LedgerEntry {
                id,
                filename,
                applied_at,
            })
            .collect())
    }

    fn db_type(&self) -> &'static str {
        "postgres"
    }
}

/// Open PostgreSQL transaction.
///
/// sqlx rolls the transaction back when it is dropped uncommitted.
pub struct PostgresTransaction {
    tx: sqlx::Transaction<'static, Postgres>,
}

#[async_trait]
impl DbTransaction for PostgresTransaction {
    async fn advisory_lock(&mut self, key: LockKey) -> DbResult<()> {
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(key.get())
            .execute(&mut *self.tx)
            .await?;
        log::debug!("Acquired advisory lock {key}");
        Ok(())
    }

    async fn create_ledger(&mut self, ledger: &LedgerTable) -> DbResult<()> {
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} (
                 id         SERIAL PRIMARY KEY,
                 filename   TEXT UNIQUE NOT NULL,
                 applied_at TIMESTAMP DEFAULT NOW()
             )",
            ledger.quoted()
        );
        (&mut *self.tx).execute(sqlx::raw_sql(&sql)).await?;
        Ok(())
    }

    async fn is_recorded(&mut self, ledger: &LedgerTable, filename: &str) -> DbResult<bool> {
        let sql = format!("SELECT 1 FROM {} WHERE filename = $1", ledger.quoted());
        let found = sqlx::query_scalar::<_, i32>(&sql)
            .bind(filename)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(found.is_some())
    }

    async fn execute_batch(&mut self, sql: &str) -> DbResult<()> {
        (&mut *self.tx).execute(sqlx::raw_sql(sql)).await?;
        Ok(())
    }

    async fn record(&mut self, ledger: &LedgerTable, filename: &str) -> DbResult<()> {
        let sql = format!("INSERT INTO {} (filename) VALUES ($1)", ledger.quoted());
        sqlx::query(&sql)
            .bind(filename)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> DbResult<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| DbError::TransactionError(format!("COMMIT failed: {e}")))
    }
}
