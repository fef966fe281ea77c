//! Per-record filter predicates.
//!
//! Shared by the query service's scan path and the interactive filter
//! session, so both evaluate selections identically.
//!
//! A filter value matches a record in three tiers, tried in order:
//!
//! 1. **Exact**: equal to the record's raw or canonical value.
//! 2. **Normalized**: the value, normalized in the record's context, equals
//!    the record's canonical value (case-insensitive).
//! 3. **Substring**: the record's canonical value contains the filter value.
//!    Only used when that canonical value is not an enumerated option for
//!    the record's family, so `XL` never matches an `XLT` record.
//!
//! Equipment values name catalog options and match through
//! [`Catalog::has_equipment`].

use crate::catalog::Catalog;
use crate::filter::{DimensionFilter, FilterState};
use crate::models::{Dimension, VehicleRecord};
use crate::normalize::normalize;

/// Whether one filter value matches a record on a dimension.
pub fn value_matches(record: &VehicleRecord, dim: Dimension, value: &str, catalog: &Catalog) -> bool {
    let value = value.trim();
    if value.is_empty() {
        return false;
    }

    if dim == Dimension::Equipment {
        return record
            .family()
            .and_then(|f| catalog.family(f).equipment_option(value))
            .is_some_and(|opt| catalog.has_equipment(record, opt));
    }

    let canonical = record.value(dim);
    if canonical.is_empty() {
        return false;
    }
    if value == canonical || value == record.raw_value(dim) {
        return true;
    }

    let normalized = normalize(dim, value, &record.context());
    if normalized.eq_ignore_ascii_case(canonical) {
        return true;
    }

    if dim == Dimension::Year || catalog.is_known_option(record.family(), dim, canonical) {
        return false;
    }
    canonical.to_lowercase().contains(&value.to_lowercase())
}

/// Series selections only constrain families that have series.
fn exempt(record: &VehicleRecord, dim: Dimension, catalog: &Catalog) -> bool {
    dim == Dimension::Series
        && !record
            .family()
            .is_some_and(|f| catalog.family(f).has_series())
}

/// Whether a record satisfies one dimension's include and exclude sets.
///
/// Included values OR together, except equipment where every included
/// option is required. Any excluded match rejects the record.
pub fn dimension_passes(
    record: &VehicleRecord,
    dim: Dimension,
    filter: &DimensionFilter,
    catalog: &Catalog,
) -> bool {
    if filter.is_empty() || exempt(record, dim, catalog) {
        return true;
    }
    let matches = |v: &String| value_matches(record, dim, v, catalog);

    let included_ok = if filter.included().is_empty() {
        true
    } else if dim == Dimension::Equipment {
        filter.included().iter().all(matches)
    } else {
        filter.included().iter().any(matches)
    };
    included_ok && !filter.excluded().iter().any(matches)
}

/// Bitmask of the dimensions a record fails. Zero means it passes all.
pub fn failure_mask(record: &VehicleRecord, state: &FilterState, catalog: &Catalog) -> u16 {
    Dimension::ALL
        .iter()
        .filter(|d| !dimension_passes(record, **d, state.get(**d), catalog))
        .fold(0, |mask, d| mask | d.bit())
}

/// Dimensions whose predicates are ignored when counting options for `dim`.
///
/// Series and status suppress each other as well as themselves.
pub fn count_ignore_mask(dim: Dimension) -> u16 {
    match dim {
        Dimension::Series | Dimension::Status => Dimension::Series.bit() | Dimension::Status.bit(),
        other => other.bit(),
    }
}

/// Full evaluation: every dimension plus the price range.
pub fn record_passes(record: &VehicleRecord, state: &FilterState, catalog: &Catalog) -> bool {
    state.price.admits(record.display_price()) && failure_mask(record, state, catalog) == 0
}
