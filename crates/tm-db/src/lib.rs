//! tm-db - Database abstraction layer for Tidemark
//!
//! This crate provides the `Database` and `DbTransaction` traits used by the
//! migration runner, with implementations for DuckDB and PostgreSQL.

pub mod advisory;
pub mod connect;
pub mod duckdb;
pub mod error;
pub mod postgres;
pub mod traits;

pub use advisory::{AdvisoryGuard, AdvisoryLocks};
pub use connect::connect;
pub use duckdb::DuckDbBackend;
pub use error::{DbError, DbResult};
pub use postgres::PostgresBackend;
pub use traits::{Database, DbTransaction, LedgerEntry};
