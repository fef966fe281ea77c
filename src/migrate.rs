use anyhow::Result;
use lot_catalog_core::snapshot::EXPECTED_COLUMNS;

use crate::config::Config;
use crate::db;

/// Create the vehicles table and its stock index. Safe to re-run.
///
/// Every expected column is stored as TEXT; `vin` is the primary key.
pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    let table = &config.source.table;

    let columns: Vec<String> = EXPECTED_COLUMNS
        .iter()
        .map(|c| {
            if *c == "vin" {
                "vin TEXT PRIMARY KEY".to_string()
            } else {
                format!("{} TEXT", c)
            }
        })
        .collect();

    // Create vehicles table
    sqlx::query(&format!(
        "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
        table,
        columns.join(",\n    ")
    ))
    .execute(&pool)
    .await?;

    // Detail lookups go by stock as often as by VIN
    sqlx::query(&format!(
        "CREATE INDEX IF NOT EXISTS idx_{}_stock ON {}(stock)",
        table, table
    ))
    .execute(&pool)
    .await?;

    pool.close().await;
    Ok(())
}
