//! Single-vehicle lookup by stock number or VIN.
//!
//! Used by the `lot get` CLI command. The HTTP transport calls
//! [`QueryService::get_one`] directly.

use anyhow::Result;
use lot_catalog_core::models::{Dimension, VehicleRecord};
use lot_catalog_core::source::RecordSource;
use std::sync::Arc;

use crate::config::Config;
use crate::query::QueryService;
use crate::sqlite_source::SqliteRecordSource;

fn price(value: Option<f64>) -> String {
    value
        .map(|p| format!("${:.0}", p))
        .unwrap_or_else(|| "-".to_string())
}

fn print_vehicle(v: &VehicleRecord) {
    println!("--- Vehicle ---");
    println!("vin:          {}", v.vin);
    println!(
        "stock:        {}",
        if v.stock.is_empty() { "(in transit)" } else { v.stock.as_str() }
    );
    println!("vehicle:      {} {} {} {}", v.year, v.make, v.model, v.trim);
    println!("family:       {}", v.family_slug());
    if !v.value(Dimension::Series).is_empty() {
        println!("series:       {}", v.value(Dimension::Series));
    }
    println!("color:        {} ({})", v.value(Dimension::Color), v.exterior);
    println!("interior:     {} {}", v.interior_color, v.interior_material);
    println!("engine:       {} ({})", v.value(Dimension::Engine), v.engine);
    println!("drivetrain:   {}", v.value(Dimension::Drivetrain));
    println!("body style:   {}", v.value(Dimension::BodyStyle));
    if !v.value(Dimension::Package).is_empty() {
        println!("package:      {}", v.value(Dimension::Package));
    }
    println!("msrp:         {}", price(v.pricing.msrp));
    println!("price:        {}", price(v.display_price()));
    if !v.vehicle_link.is_empty() {
        println!("link:         {}", v.vehicle_link);
    }
    println!();

    println!("--- Optional equipment ({}) ---", v.optional_equipment.len());
    for item in &v.optional_equipment {
        match &item.code {
            Some(code) => println!("[{}] {}", code, item.description),
            None => println!("{}", item.description),
        }
    }
}

/// CLI entry point. Exits with status 1 when nothing matches `key`.
pub async fn run_get(config: &Config, key: &str) -> Result<()> {
    let config = Arc::new(config.clone());
    let source: Arc<dyn RecordSource> = Arc::new(SqliteRecordSource::new(&config));
    let service = QueryService::new(config, source)?;

    let found = match service.get_one(key).await {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    print_vehicle(&found.vehicle);
    for d in &found.diagnostics {
        eprintln!("warning: {}", d);
    }
    Ok(())
}
