//! Migration discovery.
//!
//! A migration is any regular (non-directory) entry directly inside the
//! migrations directory whose name ends in [`MIGRATION_SUFFIX`]. The filename
//! is both the migration's identity in the ledger and its ordering key:
//! migrations are applied in ascending byte-wise order of their filenames, so
//! callers prefix them with zero-padded numbers or timestamps.

use crate::error::{CoreError, CoreResult};
use std::fs;
use std::path::{Path, PathBuf};

/// Filename suffix that marks a migration.
pub const MIGRATION_SUFFIX: &str = ".sql";

/// A migration file found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationFile {
    /// Filename including extension, e.g. `001_create_users.sql`
    pub filename: String,

    /// Full path to the file
    pub path: PathBuf,
}

impl MigrationFile {
    /// Read the SQL body of the migration.
    pub fn read_sql(&self) -> CoreResult<String> {
        fs::read_to_string(&self.path).map_err(|source| CoreError::MigrationFileRead {
            path: self.path.display().to_string(),
            source,
        })
    }
}

/// List the migrations in `dir`, sorted by filename.
///
/// Subdirectories and files without the `.sql` suffix are ignored. An empty
/// directory yields an empty list. A missing or unreadable directory is an
/// error.
pub fn discover_migrations(dir: &Path) -> CoreResult<Vec<MigrationFile>> {
    let read_err = |source| CoreError::MigrationDirRead {
        path: dir.display().to_string(),
        source,
    };

    let mut migrations = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_err)? {
        let entry = entry.map_err(read_err)?;
        if entry.file_type().map_err(read_err)?.is_dir() {
            continue;
        }

        let Some(filename) = entry.file_name().to_str().map(String::from) else {
            log::warn!(
                "Skipping migration candidate with non UTF-8 name: {}",
                entry.path().display()
            );
            continue;
        };
        if !filename.ends_with(MIGRATION_SUFFIX) {
            continue;
        }

        migrations.push(MigrationFile {
            path: entry.path(),
            filename,
        });
    }

    migrations.sort_by(|a, b| a.filename.cmp(&b.filename));
    Ok(migrations)
}

#[cfg(test)]
#[path = "migration_file_test.rs"]
mod tests;
