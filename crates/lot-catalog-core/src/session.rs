//! Interactive faceted filtering for one browsing session.
//!
//! A [`FilterSession`] owns a record set and one user's [`FilterState`].
//! Every mutation recomputes, in one pass over the selected family:
//!
//! ```text
//! family records ──failure_mask──▶ masks ──┬── all bits clear ──▶ visible (sorted)
//!                                          └── own bit ignored ──▶ option counts
//! ```
//!
//! The displayed list applies every dimension. Option counts for a
//! dimension drop that dimension's own include and exclude sets, so an
//! excluded value keeps showing how many vehicles it hides, and picking a
//! second value shows what it would add even when the combined result is
//! empty. Zero results is a normal state, never an error.

use std::borrow::Borrow;
use std::collections::BTreeSet;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

use crate::catalog::Catalog;
use crate::facets::record_values;
use crate::filter::{FilterState, PriceRange, ToggleState};
use crate::models::{Dimension, Family, VehicleRecord, STATUS_IN_STOCK, STATUS_IN_TRANSIT};
use crate::predicate::{count_ignore_mask, failure_mask, value_matches};
use crate::sort::{sort_records, SortOrder};

/// Results revealed per [`FilterSession::reveal_more`] call.
pub const REVEAL_BATCH: usize = 24;

/// One selectable value in a dimension's option list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FacetOption {
    pub value: String,
    pub label: String,
    pub count: usize,
    pub state: ToggleState,
}

/// A record index paired with its record, so sorting can report positions.
struct Indexed<'a> {
    idx: usize,
    record: &'a VehicleRecord,
}

impl Borrow<VehicleRecord> for Indexed<'_> {
    fn borrow(&self) -> &VehicleRecord {
        self.record
    }
}

pub struct FilterSession {
    records: Vec<VehicleRecord>,
    catalog: Catalog,
    family: Option<Family>,
    state: FilterState,
    sort: SortOrder,
    last_mutated: Option<Dimension>,
    rng: StdRng,
    /// Indices of records in the selected family.
    candidates: Vec<usize>,
    /// Failure mask per candidate; `None` when the price range rejects it.
    masks: Vec<Option<u16>>,
    visible: Vec<usize>,
    revealed: usize,
}

impl FilterSession {
    pub fn new(records: Vec<VehicleRecord>, catalog: Catalog) -> Self {
        Self::with_rng(records, catalog, StdRng::from_entropy())
    }

    /// A session whose random ordering is reproducible.
    pub fn with_seed(records: Vec<VehicleRecord>, catalog: Catalog, seed: u64) -> Self {
        Self::with_rng(records, catalog, StdRng::seed_from_u64(seed))
    }

    fn with_rng(records: Vec<VehicleRecord>, catalog: Catalog, rng: StdRng) -> Self {
        Self {
            records,
            catalog,
            family: None,
            state: FilterState::default(),
            sort: SortOrder::default(),
            last_mutated: None,
            rng,
            candidates: Vec::new(),
            masks: Vec::new(),
            visible: Vec::new(),
            revealed: 0,
        }
    }

    // ============ Navigation ============

    /// Enter a family's listing with a fresh filter state.
    pub fn select_family(&mut self, family: Family) {
        self.family = Some(family);
        self.state.clear();
        self.last_mutated = None;
        self.recompute();
    }

    /// Leave the listing. Nothing is visible until a family is selected.
    pub fn return_to_catalog(&mut self) {
        self.family = None;
        self.state.clear();
        self.last_mutated = None;
        self.recompute();
    }

    pub fn family(&self) -> Option<Family> {
        self.family
    }

    /// Record counts per family in homepage order, for the family cards.
    pub fn family_counts(&self) -> Vec<(Family, usize)> {
        Family::ALL
            .iter()
            .map(|f| (*f, self.records.iter().filter(|r| r.family() == Some(*f)).count()))
            .collect()
    }

    // ============ Mutations ============

    /// Advance one value through unset → included → excluded → unset.
    pub fn toggle(&mut self, dim: Dimension, value: &str) -> ToggleState {
        let next = self.state.get_mut(dim).toggle(value);
        self.mutated(Some(dim));
        next
    }

    pub fn set(&mut self, dim: Dimension, value: &str, state: ToggleState) {
        self.state.get_mut(dim).set(value, state);
        self.mutated(Some(dim));
    }

    pub fn clear_dimension(&mut self, dim: Dimension) {
        self.state.get_mut(dim).clear();
        self.mutated(Some(dim));
    }

    pub fn clear_all(&mut self) {
        self.state.clear();
        self.mutated(None);
    }

    pub fn set_price_range(&mut self, range: PriceRange) {
        self.state.price = range;
        self.mutated(None);
    }

    /// Change the ordering. Choosing `random` again reshuffles.
    pub fn set_sort(&mut self, order: SortOrder) {
        self.sort = order;
        self.recompute();
    }

    fn mutated(&mut self, dim: Option<Dimension>) {
        self.last_mutated = dim;
        self.recompute();
    }

    fn recompute(&mut self) {
        let Some(family) = self.family else {
            self.candidates.clear();
            self.masks.clear();
            self.visible.clear();
            self.revealed = 0;
            return;
        };

        self.candidates = self
            .records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.family() == Some(family))
            .map(|(i, _)| i)
            .collect();
        self.masks = self
            .candidates
            .iter()
            .map(|&i| {
                let r = &self.records[i];
                self.state
                    .price
                    .admits(r.display_price())
                    .then(|| failure_mask(r, &self.state, &self.catalog))
            })
            .collect();

        let mut passing: Vec<Indexed<'_>> = self
            .candidates
            .iter()
            .zip(&self.masks)
            .filter(|(_, m)| **m == Some(0))
            .map(|(&idx, _)| Indexed {
                idx,
                record: &self.records[idx],
            })
            .collect();
        sort_records(&mut passing, self.sort, &self.catalog, &mut self.rng);
        self.visible = passing.into_iter().map(|e| e.idx).collect();
        self.revealed = self.visible.len().min(REVEAL_BATCH);
    }

    // ============ Reads ============

    pub fn state(&self) -> &FilterState {
        &self.state
    }

    pub fn sort(&self) -> SortOrder {
        self.sort
    }

    /// The dimension touched by the most recent filter mutation.
    pub fn last_mutated(&self) -> Option<Dimension> {
        self.last_mutated
    }

    /// Every record passing all filters, in sort order.
    pub fn visible(&self) -> Vec<&VehicleRecord> {
        self.visible.iter().map(|&i| &self.records[i]).collect()
    }

    pub fn visible_count(&self) -> usize {
        self.visible.len()
    }

    /// The prefix of [`visible`](Self::visible) revealed so far.
    pub fn revealed(&self) -> Vec<&VehicleRecord> {
        self.visible[..self.revealed]
            .iter()
            .map(|&i| &self.records[i])
            .collect()
    }

    /// Reveal the next batch. Returns how many records were added.
    pub fn reveal_more(&mut self) -> usize {
        let before = self.revealed;
        self.revealed = (self.revealed + REVEAL_BATCH).min(self.visible.len());
        self.revealed - before
    }

    /// Options for one dimension, with live counts and toggle states.
    ///
    /// Configured values come first in configuration order, then values
    /// observed in the family's inventory that the configuration lacks,
    /// then any selected value matching neither. Package options narrow to
    /// the packages of the included trims. Families without series list
    /// no series options.
    pub fn options(&self, dim: Dimension) -> Vec<FacetOption> {
        if dim == Dimension::Model {
            return self
                .family_counts()
                .into_iter()
                .map(|(f, count)| FacetOption {
                    value: f.slug().to_string(),
                    label: f.display_name().to_string(),
                    count,
                    state: self.state.model.state(f.slug()),
                })
                .collect();
        }
        let Some(family) = self.family else {
            return Vec::new();
        };
        let config = self.catalog.family(family);
        if dim == Dimension::Series && !config.has_series() {
            return Vec::new();
        }

        let all_configured = config.values(dim);
        let configured = match dim {
            Dimension::Package if !self.state.trim.included().is_empty() => {
                let trims: Vec<&str> = self.state.trim.included().iter().map(String::as_str).collect();
                self.catalog.packages_for_trims(family, &trims)
            }
            _ => all_configured.clone(),
        };
        let known = |v: &str| all_configured.iter().any(|c| c.eq_ignore_ascii_case(v));

        let mut values: Vec<String> = configured.iter().map(|v| v.to_string()).collect();
        let observed: BTreeSet<String> = self
            .candidates
            .iter()
            .flat_map(|&i| record_values(&self.records[i], dim, &self.catalog))
            .filter(|v| !known(v))
            .collect();
        let mut observed: Vec<String> = observed.into_iter().collect();
        if dim == Dimension::Year {
            observed.reverse();
        }
        values.extend(observed);

        let filter = self.state.get(dim);
        for selected in filter.included().iter().chain(filter.excluded()) {
            if !values.iter().any(|v| v.eq_ignore_ascii_case(selected)) {
                values.push(selected.clone());
            }
        }

        values
            .into_iter()
            .map(|value| FacetOption {
                label: self.label(family, dim, &value),
                count: self.count(dim, &value),
                state: filter.state(&value),
                value,
            })
            .collect()
    }

    /// Records that would match `value` with `dim`'s own selections dropped.
    fn count(&self, dim: Dimension, value: &str) -> usize {
        let ignore = count_ignore_mask(dim);
        self.candidates
            .iter()
            .zip(&self.masks)
            .filter(|(_, m)| matches!(m, Some(m) if m & !ignore == 0))
            .filter(|&(&i, _)| value_matches(&self.records[i], dim, value, &self.catalog))
            .count()
    }

    fn label(&self, family: Family, dim: Dimension, value: &str) -> String {
        match dim {
            Dimension::Equipment => self
                .catalog
                .family(family)
                .equipment_option(value)
                .map(|opt| opt.label.to_string())
                .unwrap_or_else(|| value.to_string()),
            Dimension::Status if value == STATUS_IN_STOCK => "In Stock".to_string(),
            Dimension::Status if value == STATUS_IN_TRANSIT => "In Transit".to_string(),
            _ => value.to_string(),
        }
    }
}
