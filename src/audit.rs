//! Normalizer coverage audit.
//!
//! `lot audit` reads every row from the Record Source and reports, per
//! dimension, the raw spellings that no normalization rule recognized and
//! that therefore reach the catalog unchanged. Each one is either a new
//! canonical value or a vendor spelling that needs a rule.

use anyhow::{Context, Result};
use lot_catalog_core::models::{Dimension, VehicleRecord};
use lot_catalog_core::normalize::is_pass_through;
use lot_catalog_core::snapshot::build_records;
use lot_catalog_core::source::RecordSource;
use std::collections::BTreeMap;

use crate::config::Config;
use crate::sqlite_source::SqliteRecordSource;

/// Dimensions with a rule table.
const AUDITED: [Dimension; 6] = [
    Dimension::Trim,
    Dimension::Engine,
    Dimension::Drivetrain,
    Dimension::BodyStyle,
    Dimension::Color,
    Dimension::Fuel,
];

/// Pass-through raw values per dimension, with occurrence counts.
pub type AuditReport = BTreeMap<Dimension, BTreeMap<String, usize>>;

pub fn audit_records(records: &[VehicleRecord]) -> AuditReport {
    let mut report = AuditReport::new();
    for record in records {
        let ctx = record.context();
        for dim in AUDITED {
            let raw = record.raw_value(dim).trim();
            if is_pass_through(dim, raw, &ctx) {
                *report
                    .entry(dim)
                    .or_default()
                    .entry(raw.to_string())
                    .or_insert(0) += 1;
            }
        }
    }
    report
}

pub async fn run_audit(config: &Config) -> Result<()> {
    let source = SqliteRecordSource::new(config);
    let batch = source
        .fetch_all()
        .await
        .with_context(|| "Failed to read record source")?;
    let set = build_records(&batch)?;
    let report = audit_records(&set.records);

    println!("audit: {} vehicles", set.records.len());
    if report.is_empty() {
        println!("  every value matched a normalization rule");
    }
    for (dim, values) in &report {
        println!();
        println!("  {} ({} unmatched)", dim, values.len());
        for (value, count) in values {
            println!("    {:<40} {:>5}", value, count);
        }
    }
    println!("ok");
    Ok(())
}
