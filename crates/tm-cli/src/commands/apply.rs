//! Apply command implementation

use anyhow::{bail, Context, Result};
use std::time::Duration;
use tm_runner::ApplyReport;

use crate::cli::{ApplyArgs, GlobalArgs};
use crate::context::RuntimeContext;

/// Execute the apply command
pub async fn execute(args: &ApplyArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global).await?;
    let ledger = ctx.ledger();

    if args.dry_run {
        let pending = ctx
            .runner
            .pending(ledger)
            .await
            .context("Failed to list pending migrations")?;
        if pending.is_empty() {
            println!("No pending migrations");
        } else {
            for migration in &pending {
                println!("pending  {}", migration.filename);
            }
            println!("{} migration(s) would be applied", pending.len());
        }
        return Ok(());
    }

    // Dropping the run future rolls back the migration in flight
    let run = ctx.runner.apply(ledger);
    let report = tokio::select! {
        result = with_timeout(args.timeout, run) => result?,
        _ = tokio::signal::ctrl_c() => bail!("Interrupted, migration in flight rolled back"),
    };

    print_report(&report);
    Ok(())
}

async fn with_timeout<F>(timeout: Option<u64>, run: F) -> Result<ApplyReport>
where
    F: std::future::Future<Output = tm_runner::MigrateResult<ApplyReport>>,
{
    let result = match timeout {
        Some(secs) => tokio::time::timeout(Duration::from_secs(secs), run)
            .await
            .with_context(|| format!("Timed out after {secs}s"))?,
        None => run.await,
    };
    Ok(result?)
}

fn print_report(report: &ApplyReport) {
    for filename in &report.applied {
        println!("applied  {filename}");
    }
    for filename in &report.skipped {
        println!("skipped  {filename} (applied by another runner)");
    }
    if report.applied.is_empty() {
        println!("Database is up to date");
    } else {
        println!("Applied {} migration(s)", report.applied.len());
    }
}
