//! Backend selection from configuration

use crate::duckdb::DuckDbBackend;
use crate::error::{DbError, DbResult};
use crate::postgres::PostgresBackend;
use crate::traits::Database;
use std::sync::Arc;
use tm_core::{DatabaseConfig, DbType};

/// Open the backend described by `config`.
pub async fn connect(config: &DatabaseConfig) -> DbResult<Arc<dyn Database>> {
    match config.db_type {
        DbType::DuckDb => {
            log::debug!("Opening DuckDB database at {}", config.path);
            Ok(Arc::new(DuckDbBackend::new(&config.path)?))
        }
        DbType::Postgres => {
            let url = config
                .url
                .as_deref()
                .filter(|url| !url.is_empty())
                .ok_or_else(|| {
                    DbError::ConnectionError("database.url is required for postgres".to_string())
                })?;
            Ok(Arc::new(PostgresBackend::connect(url).await?))
        }
    }
}
