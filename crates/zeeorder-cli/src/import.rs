//! Import command handlers.
//!
//! Both sources go through the same column mapping the server uses, then
//! upsert in the configured batch size.

use std::path::Path;

use anyhow::Context;
use zeeorder_core::{plan_import, read_csv, AppConfig, ImportPlan};
use zeeorder_sheets::SheetTarget;

/// Import a CSV file from disk.
///
/// # Errors
///
/// Returns an error if the file cannot be read, the CSV has no data rows or
/// lacks the required headers, or a batch fails to commit.
pub(crate) async fn run_import_csv(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    path: &Path,
    dry_run: bool,
) -> anyhow::Result<()> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let text = String::from_utf8_lossy(&bytes);
    let table = read_csv(&text)?;
    let plan = plan_import(&table)?;

    apply(pool, config, &plan, dry_run, &path.display().to_string()).await
}

/// Import the configured (or overridden) spreadsheet range.
///
/// # Errors
///
/// Returns an error if no spreadsheet is configured, credentials are
/// missing or rejected, the header row lacks required columns, or a batch
/// fails to commit.
pub(crate) async fn run_import_sheets(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    spreadsheet_id: Option<&str>,
    range: Option<&str>,
    dry_run: bool,
) -> anyhow::Result<()> {
    let target = SheetTarget::resolve(&config.sheets, spreadsheet_id, range)?;
    let table = zeeorder_sheets::fetch_table(&config.sheets, &target).await?;
    if table.len() < 2 {
        println!("No rows to import.");
        return Ok(());
    }

    let plan = plan_import(&table)?;
    let source = format!("{} ({})", target.spreadsheet_id, target.range);
    apply(pool, config, &plan, dry_run, &source).await
}

async fn apply(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    plan: &ImportPlan,
    dry_run: bool,
    source: &str,
) -> anyhow::Result<()> {
    if dry_run {
        println!(
            "dry-run: {source}: would import {} products, skip {}",
            plan.imported(),
            plan.skipped
        );
        return Ok(());
    }

    let outcome = zeeorder_db::upsert_products(pool, &plan.rows, config.import_batch_size).await?;
    tracing::info!(
        source,
        upserted = outcome.upserted,
        batches = outcome.batches,
        skipped = plan.skipped,
        "import finished"
    );
    println!(
        "{source}: imported {} products in {} batches, skipped {}",
        outcome.upserted, outcome.batches, plan.skipped
    );
    Ok(())
}
