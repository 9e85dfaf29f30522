//! The migration apply loop.

use crate::error::{ApplyStage, MigrateError, MigrateResult};
use crate::status::{merge_status, MigrationStatus};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tm_core::{discover_migrations, LedgerTable, LockKey, MigrationFile};
use tm_db::{Database, DbError};

/// Outcome of a successful [`MigrationRunner::apply`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Migrations applied by this run, in order
    pub applied: Vec<String>,

    /// Pending migrations another runner recorded while this run waited for
    /// the lock
    pub skipped: Vec<String>,
}

enum Outcome {
    Applied,
    AlreadyRecorded,
}

/// Applies the migrations of one directory to one database.
pub struct MigrationRunner {
    db: Arc<dyn Database>,
    migrations_dir: PathBuf,
    lock_key: LockKey,
}

impl MigrationRunner {
    /// Runner over `migrations_dir` using [`LockKey::DEFAULT`].
    pub fn new(db: Arc<dyn Database>, migrations_dir: impl Into<PathBuf>) -> Self {
        Self {
            db,
            migrations_dir: migrations_dir.into(),
            lock_key: LockKey::DEFAULT,
        }
    }

    /// Use `key` for the per-migration advisory lock.
    pub fn with_lock_key(mut self, key: LockKey) -> Self {
        self.lock_key = key;
        self
    }

    pub fn lock_key(&self) -> LockKey {
        self.lock_key
    }

    pub fn migrations_dir(&self) -> &Path {
        &self.migrations_dir
    }

    /// Apply every pending migration, stopping at the first failure.
    ///
    /// Each migration runs in its own transaction: advisory lock, ledger
    /// re-check, SQL body, ledger insert, commit. A failed migration is rolled
    /// back and ends the run; migrations committed before it stay applied.
    pub async fn apply(&self, ledger: &LedgerTable) -> MigrateResult<ApplyReport> {
        self.ensure_ledger(ledger).await?;
        let applied = self.load_applied(ledger).await?;
        let migrations = self.discover()?;

        let mut report = ApplyReport::default();
        for migration in migrations {
            if applied.contains(&migration.filename) {
                log::debug!("Skipping applied migration {}", migration.filename);
                continue;
            }

            let sql = migration
                .read_sql()
                .map_err(|source| MigrateError::ReadFile {
                    filename: migration.filename.clone(),
                    source,
                })?;

            match self.apply_one(ledger, &migration.filename, &sql).await? {
                Outcome::Applied => {
                    log::info!("Applied migration {}", migration.filename);
                    report.applied.push(migration.filename);
                }
                Outcome::AlreadyRecorded => {
                    log::warn!(
                        "Migration {} was recorded by another runner, skipping",
                        migration.filename
                    );
                    report.skipped.push(migration.filename);
                }
            }
        }

        Ok(report)
    }

    /// Create the ledger table if needed.
    ///
    /// Runs under the advisory lock so runners starting together against a
    /// fresh database do not race on the DDL.
    pub async fn ensure_ledger(&self, ledger: &LedgerTable) -> MigrateResult<()> {
        let result: Result<(), DbError> = async {
            let mut tx = self.db.begin().await?;
            tx.advisory_lock(self.lock_key).await?;
            tx.create_ledger(ledger).await?;
            tx.commit().await
        }
        .await;
        result.map_err(|source| MigrateError::EnsureLedger { source })
    }

    /// Filenames recorded in the ledger. The ledger must exist.
    pub async fn load_applied(&self, ledger: &LedgerTable) -> MigrateResult<BTreeSet<String>> {
        self.db
            .applied_filenames(ledger)
            .await
            .map_err(|source| MigrateError::LoadApplied { source })
    }

    /// Migration files in apply order.
    pub fn discover(&self) -> MigrateResult<Vec<MigrationFile>> {
        discover_migrations(&self.migrations_dir)
            .map_err(|source| MigrateError::ReadDirectory { source })
    }

    /// Migrations [`apply`](Self::apply) would attempt right now.
    pub async fn pending(&self, ledger: &LedgerTable) -> MigrateResult<Vec<MigrationFile>> {
        self.ensure_ledger(ledger).await?;
        let applied = self.load_applied(ledger).await?;
        Ok(self
            .discover()?
            .into_iter()
            .filter(|m| !applied.contains(&m.filename))
            .collect())
    }

    /// Every discovered migration and every ledger row, merged by filename.
    pub async fn status(&self, ledger: &LedgerTable) -> MigrateResult<Vec<MigrationStatus>> {
        self.ensure_ledger(ledger).await?;
        let entries = self
            .db
            .ledger_entries(ledger)
            .await
            .map_err(|source| MigrateError::LoadApplied { source })?;
        let files = self.discover()?;
        Ok(merge_status(&files, entries))
    }

    async fn apply_one(
        &self,
        ledger: &LedgerTable,
        filename: &str,
        sql: &str,
    ) -> MigrateResult<Outcome> {
        // Dropping `tx` on any early return rolls it back
        let mut tx = self
            .db
            .begin()
            .await
            .map_err(apply_error(filename, ApplyStage::Begin))?;

        tx.advisory_lock(self.lock_key)
            .await
            .map_err(apply_error(filename, ApplyStage::Lock))?;

        if tx
            .is_recorded(ledger, filename)
            .await
            .map_err(apply_error(filename, ApplyStage::Recheck))?
        {
            return Ok(Outcome::AlreadyRecorded);
        }

        if sql.trim().is_empty() {
            log::debug!("Migration {filename} is empty, recording only");
        } else {
            tx.execute_batch(sql)
                .await
                .map_err(apply_error(filename, ApplyStage::Execute))?;
        }

        tx.record(ledger, filename)
            .await
            .map_err(apply_error(filename, ApplyStage::Record))?;

        tx.commit()
            .await
            .map_err(apply_error(filename, ApplyStage::Commit))?;

        Ok(Outcome::Applied)
    }
}

fn apply_error(filename: &str, stage: ApplyStage) -> impl FnOnce(DbError) -> MigrateError + '_ {
    move |source| MigrateError::Apply {
        filename: filename.to_string(),
        stage,
        source,
    }
}

#[cfg(test)]
#[path = "runner_test.rs"]
mod tests;
