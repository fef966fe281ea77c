//! Result ordering.
//!
//! | Order | Key |
//! |-------|-----|
//! | `stock` | stock number ascending, in-transit (empty stock) last |
//! | `random` | shuffled within four availability tiers |
//! | `price_asc` / `price_desc` | display price, missing prices last |
//! | `trim_asc` | configured trim ladder, then trim name |
//!
//! Every order breaks ties with the `stock` order, so output is
//! deterministic except for `random`.

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::models::{Dimension, VehicleRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Stock,
    Random,
    PriceAsc,
    PriceDesc,
    TrimAsc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Stock => "stock",
            SortOrder::Random => "random",
            SortOrder::PriceAsc => "price_asc",
            SortOrder::PriceDesc => "price_desc",
            SortOrder::TrimAsc => "trim_asc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "stock" => Ok(SortOrder::Stock),
            "random" => Ok(SortOrder::Random),
            "price_asc" => Ok(SortOrder::PriceAsc),
            "price_desc" => Ok(SortOrder::PriceDesc),
            "trim_asc" => Ok(SortOrder::TrimAsc),
            other => Err(format!(
                "unknown sort '{}': expected stock, random, price_asc, price_desc, or trim_asc",
                other
            )),
        }
    }
}

/// Stock ascending with empty stock last; VIN breaks ties.
pub fn compare_stock(a: &VehicleRecord, b: &VehicleRecord) -> Ordering {
    match (a.stock.is_empty(), b.stock.is_empty()) {
        (false, true) => Ordering::Less,
        (true, false) => Ordering::Greater,
        _ => a.stock.cmp(&b.stock).then_with(|| a.vin.cmp(&b.vin)),
    }
}

fn compare_price(a: &VehicleRecord, b: &VehicleRecord, descending: bool) -> Ordering {
    match (a.display_price(), b.display_price()) {
        (Some(pa), Some(pb)) => {
            let ord = pa.partial_cmp(&pb).unwrap_or(Ordering::Equal);
            if descending {
                ord.reverse()
            } else {
                ord
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn compare_trim(a: &VehicleRecord, b: &VehicleRecord, catalog: &Catalog) -> Ordering {
    let ra = catalog.trim_rank(a.family(), a.value(Dimension::Trim));
    let rb = catalog.trim_rank(b.family(), b.value(Dimension::Trim));
    let by_rank = match (ra, rb) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_rank.then_with(|| {
        a.value(Dimension::Trim)
            .to_lowercase()
            .cmp(&b.value(Dimension::Trim).to_lowercase())
    })
}

/// Availability tier for random ordering: on-lot before in-transit,
/// photographed before not.
fn tier(record: &VehicleRecord) -> usize {
    match (record.in_transit(), record.has_photo()) {
        (false, true) => 0,
        (false, false) => 1,
        (true, true) => 2,
        (true, false) => 3,
    }
}

/// Order `items` in place.
///
/// `rng` is only consulted for [`SortOrder::Random`].
pub fn sort_records<T, R>(items: &mut Vec<T>, order: SortOrder, catalog: &Catalog, rng: &mut R)
where
    T: Borrow<VehicleRecord>,
    R: Rng + ?Sized,
{
    match order {
        SortOrder::Stock => items.sort_by(|a, b| compare_stock(a.borrow(), b.borrow())),
        SortOrder::PriceAsc | SortOrder::PriceDesc => {
            let desc = order == SortOrder::PriceDesc;
            items.sort_by(|a, b| {
                compare_price(a.borrow(), b.borrow(), desc)
                    .then_with(|| compare_stock(a.borrow(), b.borrow()))
            });
        }
        SortOrder::TrimAsc => items.sort_by(|a, b| {
            compare_trim(a.borrow(), b.borrow(), catalog)
                .then_with(|| compare_stock(a.borrow(), b.borrow()))
        }),
        SortOrder::Random => {
            let mut tiers: [Vec<T>; 4] = Default::default();
            for item in items.drain(..) {
                let t = tier(item.borrow());
                tiers[t].push(item);
            }
            for mut group in tiers {
                group.shuffle(rng);
                items.extend(group);
            }
        }
    }
}
