//! SQLite-backed [`RecordSource`].
//!
//! Reads one table (or view) holding a row per vehicle. Column values are
//! handed to the core as text: integers and reals are rendered with their
//! default formatting and NULL columns are omitted from the row.
//!
//! The connection pool is opened lazily on first use and never creates the
//! database, so a missing file shows up as
//! [`CatalogError::SourceUnavailable`] on every call until it appears.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lot_catalog_core::error::CatalogError;
use lot_catalog_core::models::RawRow;
use lot_catalog_core::source::{RecordSource, SourceBatch};
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::{Column, Row};
use std::path::PathBuf;
use tokio::sync::OnceCell;

use crate::config::Config;
use crate::db;

pub struct SqliteRecordSource {
    config: Config,
    pool: OnceCell<SqlitePool>,
}

fn unavailable(e: impl std::fmt::Display) -> CatalogError {
    CatalogError::SourceUnavailable(e.to_string())
}

/// Render one column of a result row as text, or `None` for NULL.
fn cell(row: &SqliteRow, idx: usize) -> Option<String> {
    if let Ok(v) = row.try_get::<Option<String>, _>(idx) {
        return v;
    }
    if let Ok(v) = row.try_get::<Option<i64>, _>(idx) {
        return v.map(|n| n.to_string());
    }
    if let Ok(v) = row.try_get::<Option<f64>, _>(idx) {
        return v.map(|n| n.to_string());
    }
    None
}

fn raw_row(row: &SqliteRow) -> RawRow {
    row.columns()
        .iter()
        .enumerate()
        .filter_map(|(i, col)| cell(row, i).map(|v| (col.name().to_string(), v)))
        .collect()
}

impl SqliteRecordSource {
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
            pool: OnceCell::new(),
        }
    }

    fn path(&self) -> &PathBuf {
        &self.config.source.path
    }

    fn table(&self) -> &str {
        &self.config.source.table
    }

    async fn pool(&self) -> Result<&SqlitePool, CatalogError> {
        self.pool
            .get_or_try_init(|| async {
                db::connect_existing(&self.config)
                    .await
                    .map_err(|e| unavailable(format!("{:#}", e)))
            })
            .await
    }

    async fn columns(&self, pool: &SqlitePool) -> Result<Vec<String>, CatalogError> {
        let rows = sqlx::query(&format!("PRAGMA table_info({})", self.table()))
            .fetch_all(pool)
            .await
            .map_err(unavailable)?;
        rows.iter()
            .map(|r| r.try_get::<String, _>("name").map_err(unavailable))
            .collect()
    }
}

#[async_trait]
impl RecordSource for SqliteRecordSource {
    async fn fetch_all(&self) -> Result<SourceBatch, CatalogError> {
        let pool = self.pool().await?;
        let columns = self.columns(pool).await?;
        if columns.is_empty() {
            // Missing table: report no columns and let the schema check decide.
            return Ok(SourceBatch::default());
        }

        let rows = sqlx::query(&format!("SELECT * FROM {}", self.table()))
            .fetch_all(pool)
            .await
            .map_err(unavailable)?;
        let rows: Vec<RawRow> = rows.iter().map(raw_row).collect();
        tracing::debug!(table = self.table(), rows = rows.len(), "fetched record source");

        Ok(SourceBatch { columns, rows })
    }

    async fn find(&self, key: &str) -> Result<Option<RawRow>, CatalogError> {
        let key = key.trim();
        if key.is_empty() {
            return Ok(None);
        }
        let pool = self.pool().await?;
        let row = sqlx::query(&format!(
            "SELECT * FROM {} WHERE stock = ? OR vin = ? LIMIT 1",
            self.table()
        ))
        .bind(key)
        .bind(key)
        .fetch_optional(pool)
        .await
        .map_err(unavailable)?;
        Ok(row.as_ref().map(raw_row))
    }

    /// Newest mtime of the database file and its non-empty WAL sidecar.
    async fn modified_at(&self) -> Result<DateTime<Utc>, CatalogError> {
        let path = self.path();
        let meta = tokio::fs::metadata(path)
            .await
            .map_err(|e| unavailable(format!("{}: {}", path.display(), e)))?;
        let mut newest = meta.modified().map_err(unavailable)?;

        let mut wal = path.as_os_str().to_owned();
        wal.push("-wal");
        // Opening a connection creates an empty WAL; only one holding frames
        // means unflushed writes.
        if let Ok(wal_meta) = tokio::fs::metadata(PathBuf::from(wal)).await {
            if wal_meta.len() > 0 {
                if let Ok(m) = wal_meta.modified() {
                    newest = newest.max(m);
                }
            }
        }
        Ok(DateTime::<Utc>::from(newest))
    }
}
