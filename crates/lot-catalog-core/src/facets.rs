//! Facet histograms.
//!
//! A [`FacetHistogram`] maps each dimension to canonical value counts for
//! some set of records. The materializer ships a global histogram with
//! every snapshot; [`contextual`] computes the state-aware variant in which
//! each dimension is counted with its own predicate removed.

use std::collections::BTreeMap;

use crate::catalog::Catalog;
use crate::filter::FilterState;
use crate::models::{Dimension, VehicleRecord};
use crate::predicate::{count_ignore_mask, failure_mask};

/// Dimension → canonical value → record count.
pub type FacetHistogram = BTreeMap<Dimension, BTreeMap<String, usize>>;

/// The values a record contributes to a dimension's histogram.
pub fn record_values(record: &VehicleRecord, dim: Dimension, catalog: &Catalog) -> Vec<String> {
    if dim == Dimension::Equipment {
        return catalog
            .equipment_of(record)
            .into_iter()
            .map(String::from)
            .collect();
    }
    match record.value(dim) {
        "" => Vec::new(),
        v => vec![v.to_string()],
    }
}

fn add(hist: &mut FacetHistogram, record: &VehicleRecord, dim: Dimension, catalog: &Catalog) {
    for value in record_values(record, dim, catalog) {
        *hist.entry(dim).or_default().entry(value).or_insert(0) += 1;
    }
}

/// Counts over every record, ignoring any filter state.
pub fn global<'a>(
    records: impl IntoIterator<Item = &'a VehicleRecord>,
    catalog: &Catalog,
) -> FacetHistogram {
    let mut hist = FacetHistogram::new();
    for record in records {
        for dim in Dimension::ALL {
            add(&mut hist, record, dim, catalog);
        }
    }
    hist
}

/// Counts per dimension, each computed over records that pass every
/// *other* dimension's predicate and the price range.
///
/// Because a dimension's own include and exclude sets are both dropped,
/// an excluded value still shows how many records it is hiding.
pub fn contextual(records: &[VehicleRecord], state: &FilterState, catalog: &Catalog) -> FacetHistogram {
    let masks: Vec<Option<u16>> = records
        .iter()
        .map(|r| {
            state
                .price
                .admits(r.display_price())
                .then(|| failure_mask(r, state, catalog))
        })
        .collect();

    let mut hist = FacetHistogram::new();
    for dim in Dimension::ALL {
        let ignore = count_ignore_mask(dim);
        for (record, mask) in records.iter().zip(&masks) {
            if matches!(mask, Some(m) if m & !ignore == 0) {
                add(&mut hist, record, dim, catalog);
            }
        }
    }
    hist
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::row;

    fn fleet() -> Vec<VehicleRecord> {
        [
            ("V1", "A1", "XLT", "Oxford White"),
            ("V2", "", "Lariat", "Agate Black"),
            ("V3", "A3", "XLT", "Agate Black"),
        ]
        .iter()
        .map(|(vin, stock, trim, paint)| {
            VehicleRecord::from_row(&row(&[
                ("vin", vin),
                ("stock", stock),
                ("model", "F-150"),
                ("trim", trim),
                ("paint", paint),
            ]))
            .unwrap()
            .0
        })
        .collect()
    }

    #[test]
    fn test_global_counts() {
        let hist = global(&fleet(), &Catalog::builtin());
        assert_eq!(hist[&Dimension::Trim]["XLT"], 2);
        assert_eq!(hist[&Dimension::Color]["Agate Black"], 2);
        assert_eq!(hist[&Dimension::Status]["in-transit"], 1);
        assert_eq!(hist[&Dimension::Model]["f150"], 3);
        assert!(!hist.contains_key(&Dimension::Engine));
    }

    #[test]
    fn test_contextual_drops_own_predicate() {
        let records = fleet();
        let mut state = FilterState::default();
        state.color.include("Oxford White");
        let hist = contextual(&records, &state, &Catalog::builtin());

        // Color counts ignore the color selection.
        assert_eq!(hist[&Dimension::Color]["Agate Black"], 2);
        // Trim counts respect it.
        assert_eq!(hist[&Dimension::Trim]["XLT"], 1);
        assert!(!hist[&Dimension::Trim].contains_key("Lariat"));
    }

    #[test]
    fn test_excluded_value_keeps_its_count() {
        let records = fleet();
        let mut state = FilterState::default();
        state.color.exclude("Agate Black");
        let hist = contextual(&records, &state, &Catalog::builtin());
        assert_eq!(hist[&Dimension::Color]["Agate Black"], 2);
        assert_eq!(hist[&Dimension::Trim].values().sum::<usize>(), 1);
    }
}
