//! Snapshot materialization.
//!
//! Turns one [`SourceBatch`] into the full and lite snapshots the query
//! service reads. Everything here is pure: the application crate decides
//! when to run it, handles locking, and writes the files.
//!
//! # Steps
//!
//! 1. Check the batch's columns against [`EXPECTED_COLUMNS`]. Missing
//!    columns degrade to empty values; losing all of them is fatal.
//! 2. Build a [`VehicleRecord`] per row. Rows without a VIN are skipped and
//!    repeated VINs keep their first row.
//! 3. Sort by stock number, in-transit vehicles last.
//! 4. Count every (dimension, canonical value) pair across the whole set.
//! 5. Project the lite variant.

use anyhow::{bail, Result};
use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::catalog::Catalog;
use crate::error::{CatalogError, Diagnostic};
use crate::facets::{self, FacetHistogram};
use crate::models::{LiteVehicle, VehicleRecord};
use crate::sort::compare_stock;
use crate::source::SourceBatch;

pub const FULL_FILE: &str = "inventory_cache.json";
pub const LITE_FILE: &str = "inventory_cache_lite.json";

/// Columns the record builder reads.
pub const EXPECTED_COLUMNS: &[&str] = &[
    "vin",
    "stock",
    "photo_urls",
    "vehicle_link",
    "vehicle_type",
    "year",
    "make",
    "model",
    "trim",
    "paint",
    "interior_color",
    "interior_material",
    "drivetrain",
    "body_style",
    "truck_body_style",
    "rear_axle_config",
    "engine",
    "transmission_type",
    "fuel",
    "mpg",
    "msrp",
    "total_vehicle",
    "dealer_discount",
    "factory_rebate",
    "pricing",
    "equipment_group",
    "optional",
    "standard",
    "wheelbase",
    "bed_length",
    "towing_capacity",
    "payload_capacity",
    "cargo_volume",
    "ground_clearance",
    "horsepower",
    "torque",
];

/// A materialized inventory snapshot, as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot<V> {
    pub vehicles: Vec<V>,
    pub facets: FacetHistogram,
    pub last_updated: String,
    pub total_count: usize,
    pub generated_at: DateTime<Utc>,
    pub source_modified: DateTime<Utc>,
}

pub type FullSnapshot = Snapshot<VehicleRecord>;
pub type LiteSnapshot = Snapshot<LiteVehicle>;

impl<V> Snapshot<V> {
    /// Whether this snapshot reflects a source last modified at `source_modified`.
    pub fn is_current(&self, source_modified: DateTime<Utc>) -> bool {
        self.source_modified >= source_modified
    }
}

/// Fixed timezone used for the human-readable `lastUpdated` string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayZone {
    pub offset: FixedOffset,
    pub label: String,
}

impl Default for DisplayZone {
    fn default() -> Self {
        Self {
            offset: FixedOffset::west_opt(8 * 3600).expect("8h is a valid offset"),
            label: "PT".to_string(),
        }
    }
}

impl DisplayZone {
    /// Parse an offset written as `±HH:MM`.
    pub fn parse(offset: &str, label: &str) -> Result<Self> {
        let offset = offset.trim();
        let (sign, rest) = match offset.chars().next() {
            Some('+') => (1, &offset[1..]),
            Some('-') => (-1, &offset[1..]),
            _ => bail!("timezone offset '{}' must start with + or -", offset),
        };
        let Some((hours, minutes)) = rest.split_once(':') else {
            bail!("timezone offset '{}' must look like ±HH:MM", offset);
        };
        let (Ok(hours), Ok(minutes)) = (hours.parse::<i32>(), minutes.parse::<i32>()) else {
            bail!("timezone offset '{}' must look like ±HH:MM", offset);
        };
        if !(0..=14).contains(&hours) || !(0..60).contains(&minutes) {
            bail!("timezone offset '{}' is out of range", offset);
        }
        let Some(fixed) = FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)) else {
            bail!("timezone offset '{}' is out of range", offset);
        };
        Ok(Self {
            offset: fixed,
            label: label.to_string(),
        })
    }

    /// Render like `Oct 19, 2026 3:04 pm PT`.
    pub fn format(&self, at: DateTime<Utc>) -> String {
        let local = at.with_timezone(&self.offset);
        let stamp = local.format("%b %-d, %Y %-I:%M %P").to_string();
        if self.label.is_empty() {
            stamp
        } else {
            format!("{} {}", stamp, self.label)
        }
    }
}

/// Records built from a batch, plus what was lost on the way.
#[derive(Debug, Default)]
pub struct RecordSet {
    pub records: Vec<VehicleRecord>,
    pub diagnostics: Vec<Diagnostic>,
    pub skipped_rows: usize,
    pub duplicate_vins: usize,
}

/// Missing expected columns, or [`CatalogError::SchemaDrift`] if every one is missing.
pub fn check_schema(columns: &[String]) -> Result<Vec<String>, CatalogError> {
    let missing: Vec<String> = EXPECTED_COLUMNS
        .iter()
        .filter(|c| !columns.iter().any(|have| have == *c))
        .map(|c| c.to_string())
        .collect();
    if missing.len() == EXPECTED_COLUMNS.len() {
        return Err(CatalogError::SchemaDrift {
            found: columns.to_vec(),
        });
    }
    Ok(missing)
}

/// Build records from every row of a batch, in stock order.
pub fn build_records(batch: &SourceBatch) -> Result<RecordSet, CatalogError> {
    let missing = check_schema(&batch.columns)?;
    let mut set = RecordSet::default();
    if !missing.is_empty() {
        set.diagnostics.push(Diagnostic::SchemaDrift { missing });
    }

    let mut seen: HashSet<String> = HashSet::new();
    for row in &batch.rows {
        let Some((record, diagnostics)) = VehicleRecord::from_row(row) else {
            set.skipped_rows += 1;
            continue;
        };
        if !seen.insert(record.vin.clone()) {
            set.duplicate_vins += 1;
            continue;
        }
        set.diagnostics.extend(diagnostics);
        set.records.push(record);
    }
    set.records.sort_by(compare_stock);
    Ok(set)
}

/// Output of one materialization run.
#[derive(Debug)]
pub struct MaterializeOutput {
    pub full: FullSnapshot,
    pub lite: LiteSnapshot,
    pub diagnostics: Vec<Diagnostic>,
    pub skipped_rows: usize,
    pub duplicate_vins: usize,
}

/// Build both snapshots from a batch.
///
/// Fails only on total schema drift; every other problem is reported in
/// [`MaterializeOutput::diagnostics`].
pub fn materialize(
    batch: &SourceBatch,
    catalog: &Catalog,
    source_modified: DateTime<Utc>,
    generated_at: DateTime<Utc>,
    zone: &DisplayZone,
) -> Result<MaterializeOutput, CatalogError> {
    let RecordSet {
        records,
        diagnostics,
        skipped_rows,
        duplicate_vins,
    } = build_records(batch)?;

    let facets = facets::global(&records, catalog);
    let last_updated = zone.format(source_modified);
    let total_count = records.len();
    let lite_vehicles: Vec<LiteVehicle> = records.iter().map(LiteVehicle::from).collect();

    Ok(MaterializeOutput {
        lite: Snapshot {
            vehicles: lite_vehicles,
            facets: facets.clone(),
            last_updated: last_updated.clone(),
            total_count,
            generated_at,
            source_modified,
        },
        full: Snapshot {
            vehicles: records,
            facets,
            last_updated,
            total_count,
            generated_at,
            source_modified,
        },
        diagnostics,
        skipped_rows,
        duplicate_vins,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{row, Dimension, RawRow};
    use chrono::TimeZone;

    fn columns() -> Vec<String> {
        EXPECTED_COLUMNS.iter().map(|c| c.to_string()).collect()
    }

    fn batch(rows: Vec<RawRow>) -> SourceBatch {
        SourceBatch {
            columns: columns(),
            rows,
        }
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).single().unwrap()
    }

    #[test]
    fn test_every_vin_once_in_both_projections() {
        let b = batch(vec![
            row(&[("vin", "V3"), ("stock", "C3"), ("model", "F-150")]),
            row(&[("vin", "V1"), ("stock", "A1"), ("model", "F-150")]),
            row(&[("vin", "V2"), ("model", "Explorer")]),
            row(&[("vin", "V1"), ("stock", "Z9"), ("model", "Ranger")]),
            row(&[("stock", "NOVIN")]),
        ]);
        let out = materialize(&b, &Catalog::builtin(), at(100), at(200), &DisplayZone::default()).unwrap();

        let full: Vec<&str> = out.full.vehicles.iter().map(|v| v.vin.as_str()).collect();
        let lite: Vec<&str> = out.lite.vehicles.iter().map(|v| v.vin.as_str()).collect();
        assert_eq!(full, vec!["V1", "V3", "V2"]);
        assert_eq!(full, lite);
        assert_eq!(out.full.total_count, 3);
        assert_eq!(out.lite.total_count, 3);
        assert_eq!(out.skipped_rows, 1);
        assert_eq!(out.duplicate_vins, 1);
        // First row wins for a repeated VIN.
        assert_eq!(out.full.vehicles[0].stock, "A1");
    }

    #[test]
    fn test_global_facets_cover_whole_set() {
        let b = batch(vec![
            row(&[("vin", "V1"), ("stock", "A1"), ("model", "F-150"), ("paint", "Oxford White")]),
            row(&[("vin", "V2"), ("model", "F-150"), ("paint", "Agate Black")]),
            row(&[("vin", "V3"), ("stock", "A3"), ("model", "Explorer"), ("paint", "Oxford White")]),
        ]);
        let out = materialize(&b, &Catalog::builtin(), at(100), at(200), &DisplayZone::default()).unwrap();
        let colors = &out.full.facets[&Dimension::Color];
        assert_eq!(colors["Oxford White"], 2);
        assert_eq!(colors["Agate Black"], 1);
        assert_eq!(out.full.facets[&Dimension::Model]["f150"], 2);
        assert_eq!(out.full.facets, out.lite.facets);
    }

    #[test]
    fn test_partial_schema_drift_degrades() {
        let b = SourceBatch {
            columns: vec!["vin".into(), "stock".into(), "model".into()],
            rows: vec![row(&[("vin", "V1"), ("stock", "A1"), ("model", "F-150")])],
        };
        let out = materialize(&b, &Catalog::builtin(), at(100), at(200), &DisplayZone::default()).unwrap();
        assert_eq!(out.full.total_count, 1);
        match &out.diagnostics[0] {
            Diagnostic::SchemaDrift { missing } => {
                assert!(missing.contains(&"paint".to_string()));
                assert!(!missing.contains(&"vin".to_string()));
            }
            other => panic!("unexpected diagnostic: {:?}", other),
        }
    }

    #[test]
    fn test_total_schema_drift_is_fatal() {
        let b = SourceBatch {
            columns: vec!["id".into(), "color_code".into()],
            rows: vec![],
        };
        let err = materialize(&b, &Catalog::builtin(), at(100), at(200), &DisplayZone::default()).unwrap_err();
        assert!(matches!(err, CatalogError::SchemaDrift { .. }));
    }

    #[test]
    fn test_last_updated_format() {
        let zone = DisplayZone::parse("-07:00", "PT").unwrap();
        let t = Utc.with_ymd_and_hms(2026, 10, 19, 22, 4, 0).single().unwrap();
        assert_eq!(zone.format(t), "Oct 19, 2026 3:04 pm PT");

        let utc = DisplayZone::parse("+00:00", "").unwrap();
        assert_eq!(utc.format(t), "Oct 19, 2026 10:04 pm");
    }

    #[test]
    fn test_display_zone_rejects_garbage() {
        assert!(DisplayZone::parse("PST", "PT").is_err());
        assert!(DisplayZone::parse("-8", "PT").is_err());
        assert!(DisplayZone::parse("+25:00", "").is_err());
    }

    #[test]
    fn test_snapshot_json_keys() {
        let b = batch(vec![row(&[("vin", "V1"), ("stock", "A1")])]);
        let out = materialize(&b, &Catalog::builtin(), at(100), at(200), &DisplayZone::default()).unwrap();
        let json = serde_json::to_value(&out.lite).unwrap();
        for key in ["vehicles", "facets", "lastUpdated", "totalCount", "generatedAt", "sourceModified"] {
            assert!(json.get(key).is_some(), "missing key {}", key);
        }
        let back: LiteSnapshot = serde_json::from_value(json).unwrap();
        assert_eq!(back, out.lite);
    }

    #[test]
    fn test_is_current() {
        let b = batch(vec![row(&[("vin", "V1")])]);
        let out = materialize(&b, &Catalog::builtin(), at(100), at(200), &DisplayZone::default()).unwrap();
        assert!(out.full.is_current(at(100)));
        assert!(!out.full.is_current(at(101)));
    }
}
