//! Record Source loading.
//!
//! `lot import <file.json>` upserts raw vendor rows into the vehicles
//! table, keyed by VIN. The file is a JSON array of objects mapping column
//! names to values:
//!
//! ```json
//! [{"vin": "1FTFW1E50PFA00001", "stock": "A1", "model": "F-150",
//!   "optional": [{"description": "Twin Panel Moonroof"}]}]
//! ```
//!
//! Scalars are stored as text. Arrays and objects (the embedded
//! `optional`, `standard`, and `pricing` fields) are stored as JSON text.
//! Each imported row replaces the stored row for its VIN entirely. With
//! `--prune`, stored rows whose VIN is absent from the file are deleted.

use anyhow::{bail, Context, Result};
use lot_catalog_core::snapshot::EXPECTED_COLUMNS;
use serde_json::{Map, Value};
use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use crate::config::Config;
use crate::db;
use crate::migrate;

/// Counts from one import run.
#[derive(Debug, Default, PartialEq)]
pub struct ImportSummary {
    pub upserted: usize,
    pub skipped: usize,
    pub pruned: usize,
    pub unknown_columns: BTreeSet<String>,
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

fn vin_of(obj: &Map<String, Value>) -> Option<String> {
    obj.get("vin")
        .and_then(text)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub async fn import_file(config: &Config, path: &Path, prune: bool) -> Result<ImportSummary> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read import file: {}", path.display()))?;
    let parsed: Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse import file: {}", path.display()))?;
    let Value::Array(items) = parsed else {
        bail!("import file must contain a JSON array of objects");
    };

    migrate::run_migrations(config).await?;
    let pool = db::connect(config).await?;
    let table = &config.source.table;

    let placeholders = vec!["?"; EXPECTED_COLUMNS.len()].join(", ");
    let updates: Vec<String> = EXPECTED_COLUMNS
        .iter()
        .filter(|c| **c != "vin")
        .map(|c| format!("{} = excluded.{}", c, c))
        .collect();
    let upsert = format!(
        "INSERT INTO {} ({}) VALUES ({}) ON CONFLICT(vin) DO UPDATE SET {}",
        table,
        EXPECTED_COLUMNS.join(", "),
        placeholders,
        updates.join(", ")
    );

    let mut summary = ImportSummary::default();
    let mut seen: HashSet<String> = HashSet::new();
    let mut tx = pool.begin().await?;

    for item in &items {
        let Some(obj) = item.as_object() else {
            summary.skipped += 1;
            continue;
        };
        let Some(vin) = vin_of(obj) else {
            summary.skipped += 1;
            continue;
        };
        for key in obj.keys() {
            if !EXPECTED_COLUMNS.contains(&key.as_str()) {
                summary.unknown_columns.insert(key.clone());
            }
        }

        let mut query = sqlx::query(&upsert);
        for column in EXPECTED_COLUMNS {
            let value = if *column == "vin" {
                Some(vin.clone())
            } else {
                obj.get(*column).and_then(text)
            };
            query = query.bind(value);
        }
        query.execute(&mut *tx).await?;
        seen.insert(vin);
        summary.upserted += 1;
    }

    if prune {
        let stored: Vec<String> = sqlx::query_scalar(&format!("SELECT vin FROM {}", table))
            .fetch_all(&mut *tx)
            .await?;
        for vin in stored.iter().filter(|v| !seen.contains(*v)) {
            sqlx::query(&format!("DELETE FROM {} WHERE vin = ?", table))
                .bind(vin)
                .execute(&mut *tx)
                .await?;
            summary.pruned += 1;
        }
    }

    tx.commit().await?;
    pool.close().await;

    if !summary.unknown_columns.is_empty() {
        tracing::warn!(
            columns = ?summary.unknown_columns,
            "ignored columns not in the record schema"
        );
    }
    if summary.skipped > 0 {
        tracing::warn!(skipped = summary.skipped, "skipped import rows without a VIN");
    }
    Ok(summary)
}

pub async fn run_import(config: &Config, path: &Path, prune: bool) -> Result<()> {
    let summary = import_file(config, path, prune).await?;
    println!("import {}", path.display());
    println!("  upserted: {}", summary.upserted);
    println!("  skipped: {}", summary.skipped);
    if prune {
        println!("  pruned: {}", summary.pruned);
    }
    println!("ok");
    Ok(())
}
