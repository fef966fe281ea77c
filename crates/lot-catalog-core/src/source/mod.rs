//! Record source abstraction.
//!
//! The [`RecordSource`] trait is the catalog's only view of raw inventory:
//! a full read of every row, a keyed lookup for detail pages, and a
//! modification time used for snapshot staleness checks.
//!
//! Implementations must be `Send + Sync` so the query service can share
//! one source across concurrent requests.

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::CatalogError;
use crate::models::RawRow;

/// Every row of the source together with the column names it exposes.
///
/// Columns are reported separately from rows so schema drift is visible
/// even when the source holds no rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceBatch {
    pub columns: Vec<String>,
    pub rows: Vec<RawRow>,
}

/// Read access to raw vehicle rows.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`fetch_all`](RecordSource::fetch_all) | Every row plus the column list |
/// | [`find`](RecordSource::find) | One row whose `stock` or `vin` equals the key |
/// | [`modified_at`](RecordSource::modified_at) | Last modification time |
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Read every row.
    async fn fetch_all(&self) -> Result<SourceBatch, CatalogError>;

    /// Look up one row by stock number or VIN.
    async fn find(&self, key: &str) -> Result<Option<RawRow>, CatalogError>;

    /// When the source last changed.
    async fn modified_at(&self) -> Result<DateTime<Utc>, CatalogError>;
}
