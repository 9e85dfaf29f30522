//! tm-runner - Migration runner for Tidemark
//!
//! [`MigrationRunner`] applies every `.sql` file of a directory that is not
//! yet recorded in the ledger table, one transaction per file, in filename
//! order. Each transaction holds an advisory lock so concurrent runners
//! against the same database never apply a migration twice.

pub mod error;
pub mod runner;
pub mod status;

pub use error::{ApplyStage, MigrateError, MigrateResult};
pub use runner::{ApplyReport, MigrationRunner};
pub use status::{MigrationState, MigrationStatus};
