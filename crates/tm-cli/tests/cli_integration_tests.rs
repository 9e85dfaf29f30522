//! Integration tests for the tidemark binary against file-backed DuckDB

use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

/// Path to the compiled tidemark binary
fn tidemark_bin() -> String {
    env!("CARGO_BIN_EXE_tidemark").to_string()
}

/// Run `tidemark` in `project` and return (stdout, stderr, success).
fn run_tidemark(project: &Path, args: &[&str]) -> (String, String, bool) {
    let output = Command::new(tidemark_bin())
        .args(args)
        .arg("--project-dir")
        .arg(project)
        .env_remove("TIDEMARK_DATABASE_URL")
        .env_remove("RUST_LOG")
        .output()
        .unwrap_or_else(|e| panic!("Failed to execute tidemark with args {:?}: {}", args, e));
    (
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
        output.status.success(),
    )
}

/// Project with a config pointing at a DuckDB file inside the project.
fn sample_project(migrations: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("app.duckdb");
    fs::write(
        dir.path().join("tidemark.yml"),
        format!(
            "migrations_dir: migrations\ndatabase:\n  type: duckdb\n  path: \"{}\"\n",
            db_path.display()
        ),
    )
    .unwrap();
    fs::create_dir(dir.path().join("migrations")).unwrap();
    for (name, sql) in migrations {
        fs::write(dir.path().join("migrations").join(name), sql).unwrap();
    }
    dir
}

// ── tidemark apply ─────────────────────────────────────────────────────

#[test]
fn test_apply_then_noop() {
    let project = sample_project(&[
        ("001_create.sql", "CREATE TABLE users (id INTEGER);"),
        ("002_seed.sql", "INSERT INTO users VALUES (1);"),
    ]);

    let (stdout, stderr, ok) = run_tidemark(project.path(), &["apply"]);
    assert!(ok, "apply should succeed.\nstdout: {stdout}\nstderr: {stderr}");
    assert!(stdout.contains("applied  001_create.sql"));
    assert!(stdout.contains("applied  002_seed.sql"));
    assert!(stdout.contains("Applied 2 migration(s)"));

    let (stdout, _, ok) = run_tidemark(project.path(), &["apply"]);
    assert!(ok);
    assert!(stdout.contains("Database is up to date"));
}

#[test]
fn test_apply_failure_exits_nonzero() {
    let project = sample_project(&[
        ("001_create.sql", "CREATE TABLE users (id INTEGER);"),
        ("002_broken.sql", "INSERT INTO nowhere VALUES (1);"),
    ]);

    let (stdout, stderr, ok) = run_tidemark(project.path(), &["apply"]);
    assert!(!ok, "apply should fail.\nstdout: {stdout}\nstderr: {stderr}");
    assert!(stderr.contains("002_broken.sql"), "stderr: {stderr}");

    let (stdout, _, ok) = run_tidemark(project.path(), &["status", "--output", "json"]);
    assert!(ok);
    let rows: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(rows[0]["state"], "applied");
    assert_eq!(rows[1]["filename"], "002_broken.sql");
    assert_eq!(rows[1]["state"], "pending");
}

#[test]
fn test_dry_run_applies_nothing() {
    let project = sample_project(&[("001_create.sql", "CREATE TABLE users (id INTEGER);")]);

    let (stdout, _, ok) = run_tidemark(project.path(), &["apply", "--dry-run"]);
    assert!(ok);
    assert!(stdout.contains("pending  001_create.sql"));
    assert!(stdout.contains("1 migration(s) would be applied"));

    let (stdout, _, ok) = run_tidemark(project.path(), &["status"]);
    assert!(ok);
    assert!(stdout.contains("1 migration(s), 1 pending"));
}

// ── tidemark status ────────────────────────────────────────────────────

#[test]
fn test_status_table_after_apply() {
    let project = sample_project(&[("001_create.sql", "CREATE TABLE users (id INTEGER);")]);
    run_tidemark(project.path(), &["apply"]);
    fs::write(
        project.path().join("migrations/002_more.sql"),
        "CREATE TABLE orders (id INTEGER);",
    )
    .unwrap();

    let (stdout, stderr, ok) = run_tidemark(project.path(), &["status"]);
    assert!(ok, "status should succeed.\nstderr: {stderr}");
    assert!(stdout.contains("FILENAME"));
    assert!(stdout.lines().any(|l| l.starts_with("001_create.sql") && l.contains("applied")));
    assert!(stdout.lines().any(|l| l.starts_with("002_more.sql") && l.contains("pending")));
}

#[test]
fn test_invalid_ledger_table_rejected() {
    let project = TempDir::new().unwrap();
    fs::write(
        project.path().join("tidemark.yml"),
        "ledger_table: \"users; DROP TABLE users\"\n",
    )
    .unwrap();

    let (_, stderr, ok) = run_tidemark(project.path(), &["status"]);
    assert!(!ok);
    assert!(stderr.contains("E004"), "stderr: {stderr}");
}
