//! Snapshot overview and global facet histogram.
//!
//! `lot facets` reads the full snapshot and prints its header followed by
//! the value counts of every dimension, most common value first. It gives
//! a quick check that a materialization produced the expected inventory
//! and that vendor spellings collapsed into canonical values.

use anyhow::Result;
use chrono::{DateTime, Utc};
use lot_catalog_core::facets::FacetHistogram;
use lot_catalog_core::models::{Dimension, VehicleRecord};

use crate::config::Config;
use crate::materialize::{full_path, read_snapshot};

/// Values of one dimension ordered by count descending, then value.
pub fn ranked(hist: &FacetHistogram, dim: Dimension) -> Vec<(&str, usize)> {
    let mut values: Vec<(&str, usize)> = hist
        .get(&dim)
        .map(|m| m.iter().map(|(v, c)| (v.as_str(), *c)).collect())
        .unwrap_or_default();
    values.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    values
}

/// Run the facets command: read the full snapshot and print a summary.
pub async fn run_facets(config: &Config) -> Result<()> {
    let path = full_path(config);
    let snapshot = read_snapshot::<VehicleRecord>(&path)?;
    let size = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);

    println!("Inventory snapshot");
    println!("==================");
    println!();
    println!("  File:          {}", path.display());
    println!("  Size:          {}", format_bytes(size));
    println!("  Vehicles:      {}", snapshot.total_count);
    println!("  Last updated:  {}", snapshot.last_updated);
    println!("  Generated:     {}", format_age(snapshot.generated_at, Utc::now()));

    for dim in Dimension::ALL {
        let values = ranked(&snapshot.facets, dim);
        if values.is_empty() {
            continue;
        }
        println!();
        println!("  {} ({} values)", dim, values.len());
        println!("  {}", "-".repeat(44));
        for (value, count) in values {
            println!("  {:<36} {:>6}", value, count);
        }
    }
    println!();
    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

/// Format a timestamp relative to `now` (e.g. "3 hours ago").
fn format_age(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let delta = (now - at).num_seconds();
    if delta < 0 {
        return at.format("%Y-%m-%d %H:%M").to_string();
    }
    if delta < 60 {
        "just now".to_string()
    } else if delta < 3600 {
        let mins = delta / 60;
        format!("{} min{} ago", mins, if mins == 1 { "" } else { "s" })
    } else if delta < 86400 {
        let hours = delta / 3600;
        format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" })
    } else {
        at.format("%Y-%m-%d %H:%M").to_string()
    }
}
