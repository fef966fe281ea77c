//! In-memory [`RecordSource`] for tests and embedding.
//!
//! Rows live behind `std::sync::RwLock`. The source can be switched
//! unavailable to exercise degraded paths, and its modification time is
//! set explicitly rather than read from a clock.

use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::CatalogError;
use crate::models::RawRow;
use crate::snapshot::EXPECTED_COLUMNS;

use super::{RecordSource, SourceBatch};

pub struct InMemoryRecordSource {
    columns: RwLock<Vec<String>>,
    rows: RwLock<Vec<RawRow>>,
    modified: RwLock<DateTime<Utc>>,
    available: RwLock<bool>,
}

impl InMemoryRecordSource {
    /// A source exposing every expected column.
    pub fn new(rows: Vec<RawRow>, modified: DateTime<Utc>) -> Self {
        Self::with_columns(
            EXPECTED_COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows,
            modified,
        )
    }

    pub fn with_columns(columns: Vec<String>, rows: Vec<RawRow>, modified: DateTime<Utc>) -> Self {
        Self {
            columns: RwLock::new(columns),
            rows: RwLock::new(rows),
            modified: RwLock::new(modified),
            available: RwLock::new(true),
        }
    }

    /// Replace every row and bump the modification time.
    pub fn replace(&self, rows: Vec<RawRow>, modified: DateTime<Utc>) {
        *self.rows.write().unwrap() = rows;
        *self.modified.write().unwrap() = modified;
    }

    pub fn touch(&self, modified: DateTime<Utc>) {
        *self.modified.write().unwrap() = modified;
    }

    pub fn set_available(&self, available: bool) {
        *self.available.write().unwrap() = available;
    }

    fn check(&self) -> Result<(), CatalogError> {
        if *self.available.read().unwrap() {
            Ok(())
        } else {
            Err(CatalogError::SourceUnavailable(
                "in-memory source switched off".to_string(),
            ))
        }
    }
}

#[async_trait]
impl RecordSource for InMemoryRecordSource {
    async fn fetch_all(&self) -> Result<SourceBatch, CatalogError> {
        self.check()?;
        Ok(SourceBatch {
            columns: self.columns.read().unwrap().clone(),
            rows: self.rows.read().unwrap().clone(),
        })
    }

    async fn find(&self, key: &str) -> Result<Option<RawRow>, CatalogError> {
        self.check()?;
        let key = key.trim();
        if key.is_empty() {
            return Ok(None);
        }
        let rows = self.rows.read().unwrap();
        Ok(rows
            .iter()
            .find(|r| {
                ["stock", "vin"]
                    .iter()
                    .any(|col| r.get(*col).map(|v| v.trim()) == Some(key))
            })
            .cloned())
    }

    async fn modified_at(&self) -> Result<DateTime<Utc>, CatalogError> {
        self.check()?;
        Ok(*self.modified.read().unwrap())
    }
}
