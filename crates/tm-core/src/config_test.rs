use super::*;
use tempfile::TempDir;

#[test]
fn test_parse_minimal_config() {
    let config: Config = serde_yaml::from_str("{}").unwrap();
    assert_eq!(config.migrations_dir, "migrations");
    assert_eq!(config.ledger_table.as_str(), "schema_migrations");
    assert_eq!(config.lock_key, LockKey::DEFAULT);
    assert_eq!(config.database.db_type, DbType::DuckDb);
    assert_eq!(config.database.path, "tidemark.duckdb");
    assert!(config.validate().is_ok());
}

#[test]
fn test_parse_full_config() {
    let yaml = r#"
migrations_dir: db/migrations
ledger_table: ops.applied_migrations
lock_key: 42
database:
  type: postgres
  url: postgres://app@localhost/app
"#;
    let config: Config = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(config.migrations_dir, "db/migrations");
    assert_eq!(config.ledger_table.schema(), Some("ops"));
    assert_eq!(config.lock_key.get(), 42);
    assert_eq!(config.database.db_type, DbType::Postgres);
    assert_eq!(
        config.database.url.as_deref(),
        Some("postgres://app@localhost/app")
    );
    assert!(config.validate().is_ok());
}

#[test]
fn test_invalid_ledger_table_rejected_at_parse() {
    let result: Result<Config, _> =
        serde_yaml::from_str("ledger_table: \"migrations; DROP TABLE users\"");
    assert!(result.is_err());
}

#[test]
fn test_unknown_field_rejected() {
    let result: Result<Config, _> = serde_yaml::from_str("migration_dir: typo");
    assert!(result.is_err());
}

#[test]
fn test_postgres_requires_url() {
    let config: Config = serde_yaml::from_str("database:\n  type: postgres").unwrap();
    let err = config.validate().unwrap_err();
    assert!(matches!(err, CoreError::ConfigInvalid { .. }));
    assert!(err.to_string().contains("database.url"));
}

#[test]
fn test_empty_migrations_dir_rejected() {
    let config: Config = serde_yaml::from_str("migrations_dir: \"  \"").unwrap();
    assert!(config.validate().is_err());
}

#[test]
fn test_database_config_from_url() {
    let pg = DatabaseConfig::from_url("postgresql://localhost/app");
    assert_eq!(pg.db_type, DbType::Postgres);
    assert_eq!(pg.url.as_deref(), Some("postgresql://localhost/app"));

    let duck = DatabaseConfig::from_url("./dev.duckdb");
    assert_eq!(duck.db_type, DbType::DuckDb);
    assert_eq!(duck.path, "./dev.duckdb");

    let mem = DatabaseConfig::from_url(":memory:");
    assert_eq!(mem.db_type, DbType::DuckDb);
}

#[test]
fn test_load_from_dir_reads_yml() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("tidemark.yml"), "migrations_dir: sql\n").unwrap();

    let config = Config::load_from_dir(dir.path()).unwrap();
    assert_eq!(config.migrations_dir, "sql");
}

#[test]
fn test_load_from_dir_reads_yaml_extension() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("tidemark.yaml"), "lock_key: 7\n").unwrap();

    let config = Config::load_from_dir(dir.path()).unwrap();
    assert_eq!(config.lock_key.get(), 7);
}

#[test]
fn test_load_from_dir_defaults_when_missing() {
    let dir = TempDir::new().unwrap();
    let config = Config::load_from_dir(dir.path()).unwrap();
    assert_eq!(config.migrations_dir, "migrations");
}

#[test]
fn test_load_missing_file_is_error() {
    let dir = TempDir::new().unwrap();
    let err = Config::load(&dir.path().join("nope.yml")).unwrap_err();
    assert!(matches!(err, CoreError::ConfigNotFound { .. }));
}

#[test]
fn test_load_invalid_yaml_reports_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tidemark.yml");
    std::fs::write(&path, "lock_key: [not, a, number]\n").unwrap();

    let err = Config::load(&path).unwrap_err();
    assert!(matches!(err, CoreError::ConfigParseError { .. }));
    assert!(err.to_string().contains("tidemark.yml"));
}

#[test]
fn test_migrations_dir_absolute() {
    let root = PathBuf::from("/srv/app");
    let config = Config::default();
    assert_eq!(
        config.migrations_dir_absolute(&root),
        PathBuf::from("/srv/app/migrations")
    );

    let config = Config {
        migrations_dir: "/opt/migrations".to_string(),
        ..Config::default()
    };
    assert_eq!(
        config.migrations_dir_absolute(&root),
        PathBuf::from("/opt/migrations")
    );
}
