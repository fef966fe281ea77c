use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

use crate::config::Config;

/// Open the Record Source database, creating it when missing.
pub async fn connect(config: &Config) -> Result<SqlitePool> {
    let db_path = &config.source.path;

    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    Ok(pool)
}

/// Open an existing Record Source database without creating it.
///
/// Readers use this so a missing database surfaces as unavailable instead
/// of silently becoming an empty one.
pub async fn connect_existing(config: &Config) -> Result<SqlitePool> {
    let db_path = &config.source.path;
    if !db_path.exists() {
        anyhow::bail!("record source not found: {}", db_path.display());
    }

    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))?
        .create_if_missing(false);

    SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to open record source: {}", db_path.display()))
}
