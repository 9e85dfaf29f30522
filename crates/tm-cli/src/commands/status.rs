//! Status command implementation

use anyhow::{Context, Result};
use tm_runner::{MigrationState, MigrationStatus};

use crate::cli::{GlobalArgs, StatusArgs, StatusOutput};
use crate::commands::common::print_table;
use crate::context::RuntimeContext;

/// Execute the status command
pub async fn execute(args: &StatusArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global).await?;
    let rows = ctx
        .runner
        .status(ctx.ledger())
        .await
        .context("Failed to read migration status")?;

    match args.output {
        StatusOutput::Table => print_status_table(&rows),
        StatusOutput::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
    }

    let missing = rows
        .iter()
        .filter(|r| r.state == MigrationState::Missing)
        .count();
    if missing > 0 {
        log::warn!("{missing} recorded migration(s) have no file in the migrations directory");
    }

    Ok(())
}

fn print_status_table(rows: &[MigrationStatus]) {
    if rows.is_empty() {
        println!("No migrations found");
        return;
    }

    let table: Vec<Vec<String>> = rows
        .iter()
        .map(|r| {
            vec![
                r.filename.clone(),
                r.state.to_string(),
                r.applied_at
                    .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ]
        })
        .collect();
    print_table(&["FILENAME", "STATE", "APPLIED_AT"], &table);

    let pending = rows
        .iter()
        .filter(|r| r.state == MigrationState::Pending)
        .count();
    println!();
    println!("{} migration(s), {} pending", rows.len(), pending);
}
