//! Runtime context for CLI commands

use anyhow::{Context, Result};
use std::path::Path;
use tm_core::{Config, DatabaseConfig, LedgerTable};
use tm_runner::MigrationRunner;

use crate::cli::GlobalArgs;

/// Loaded configuration plus a runner bound to the target database
pub struct RuntimeContext {
    /// Effective configuration after command-line overrides
    pub config: Config,

    /// Runner over the configured migrations directory
    pub runner: MigrationRunner,
}

impl RuntimeContext {
    /// Create a new runtime context from global arguments
    pub async fn new(args: &GlobalArgs) -> Result<Self> {
        let config = load_config(args)?;
        let project_path = Path::new(&args.project_dir);

        log::debug!(
            "Connecting to {} database for {}",
            config.database.db_type,
            project_path.display()
        );
        let db = tm_db::connect(&config.database)
            .await
            .context("Failed to connect to database")?;

        let runner = MigrationRunner::new(db, config.migrations_dir_absolute(project_path))
            .with_lock_key(config.lock_key);

        Ok(Self { config, runner })
    }

    /// Ledger table the commands read and write
    pub fn ledger(&self) -> &LedgerTable {
        &self.config.ledger_table
    }
}

/// Load config from the custom path or project directory, then apply
/// `--database-url`.
pub(crate) fn load_config(args: &GlobalArgs) -> Result<Config> {
    let mut config = if let Some(config_path) = &args.config {
        Config::load(Path::new(config_path)).context("Failed to load configuration file")?
    } else {
        Config::load_from_dir(Path::new(&args.project_dir))
            .context("Failed to load project configuration")?
    };

    if let Some(url) = args.database_url.as_deref().filter(|u| !u.is_empty()) {
        config.database = DatabaseConfig::from_url(url);
    }

    Ok(config)
}
