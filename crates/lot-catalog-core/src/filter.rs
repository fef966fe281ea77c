//! Include/exclude filter state.
//!
//! [`FilterState`] holds one [`DimensionFilter`] per [`Dimension`] as named
//! struct fields, plus an optional price range. Within a dimension the
//! included and excluded sets are kept disjoint: moving a value into one
//! set removes it from the other.

use std::collections::BTreeSet;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::models::Dimension;

/// The three states a (dimension, value) pair can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToggleState {
    #[default]
    Unset,
    Included,
    Excluded,
}

impl ToggleState {
    /// Unset → Included → Excluded → Unset.
    pub fn next(self) -> Self {
        match self {
            ToggleState::Unset => ToggleState::Included,
            ToggleState::Included => ToggleState::Excluded,
            ToggleState::Excluded => ToggleState::Unset,
        }
    }
}

/// Included and excluded values for one dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionFilter {
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    included: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    excluded: BTreeSet<String>,
}

impl DimensionFilter {
    pub fn included(&self) -> &BTreeSet<String> {
        &self.included
    }

    pub fn excluded(&self) -> &BTreeSet<String> {
        &self.excluded
    }

    pub fn is_empty(&self) -> bool {
        self.included.is_empty() && self.excluded.is_empty()
    }

    pub fn state(&self, value: &str) -> ToggleState {
        if self.included.contains(value) {
            ToggleState::Included
        } else if self.excluded.contains(value) {
            ToggleState::Excluded
        } else {
            ToggleState::Unset
        }
    }

    /// Put `value` in exactly the set named by `state`.
    pub fn set(&mut self, value: &str, state: ToggleState) {
        let value = value.trim();
        if value.is_empty() {
            return;
        }
        self.included.remove(value);
        self.excluded.remove(value);
        match state {
            ToggleState::Included => {
                self.included.insert(value.to_string());
            }
            ToggleState::Excluded => {
                self.excluded.insert(value.to_string());
            }
            ToggleState::Unset => {}
        }
    }

    /// Advance `value` one step through the three-state cycle.
    pub fn toggle(&mut self, value: &str) -> ToggleState {
        let next = self.state(value.trim()).next();
        self.set(value, next);
        next
    }

    pub fn include(&mut self, value: &str) {
        self.set(value, ToggleState::Included);
    }

    pub fn exclude(&mut self, value: &str) {
        self.set(value, ToggleState::Excluded);
    }

    pub fn clear(&mut self) {
        self.included.clear();
        self.excluded.clear();
    }
}

/// Inclusive price bounds. A missing price counts as unbounded above.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl PriceRange {
    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    pub fn admits(&self, price: Option<f64>) -> bool {
        let price = price.unwrap_or(f64::INFINITY);
        self.min.map_or(true, |min| price >= min) && self.max.map_or(true, |max| price <= max)
    }
}

/// Filter selections across every dimension.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterState {
    pub model: DimensionFilter,
    pub year: DimensionFilter,
    pub trim: DimensionFilter,
    pub series: DimensionFilter,
    pub package: DimensionFilter,
    pub engine: DimensionFilter,
    pub drivetrain: DimensionFilter,
    pub body_style: DimensionFilter,
    pub color: DimensionFilter,
    pub interior: DimensionFilter,
    pub equipment: DimensionFilter,
    pub status: DimensionFilter,
    pub fuel: DimensionFilter,
    pub transmission: DimensionFilter,
    pub price: PriceRange,
}

impl FilterState {
    pub fn get(&self, dim: Dimension) -> &DimensionFilter {
        match dim {
            Dimension::Model => &self.model,
            Dimension::Year => &self.year,
            Dimension::Trim => &self.trim,
            Dimension::Series => &self.series,
            Dimension::Package => &self.package,
            Dimension::Engine => &self.engine,
            Dimension::Drivetrain => &self.drivetrain,
            Dimension::BodyStyle => &self.body_style,
            Dimension::Color => &self.color,
            Dimension::Interior => &self.interior,
            Dimension::Equipment => &self.equipment,
            Dimension::Status => &self.status,
            Dimension::Fuel => &self.fuel,
            Dimension::Transmission => &self.transmission,
        }
    }

    pub fn get_mut(&mut self, dim: Dimension) -> &mut DimensionFilter {
        match dim {
            Dimension::Model => &mut self.model,
            Dimension::Year => &mut self.year,
            Dimension::Trim => &mut self.trim,
            Dimension::Series => &mut self.series,
            Dimension::Package => &mut self.package,
            Dimension::Engine => &mut self.engine,
            Dimension::Drivetrain => &mut self.drivetrain,
            Dimension::BodyStyle => &mut self.body_style,
            Dimension::Color => &mut self.color,
            Dimension::Interior => &mut self.interior,
            Dimension::Equipment => &mut self.equipment,
            Dimension::Status => &mut self.status,
            Dimension::Fuel => &mut self.fuel,
            Dimension::Transmission => &mut self.transmission,
        }
    }

    /// No dimension selections and no price bounds.
    pub fn is_empty(&self) -> bool {
        self.price.is_unbounded() && Dimension::ALL.iter().all(|d| self.get(*d).is_empty())
    }

    pub fn clear(&mut self) {
        *self = FilterState::default();
    }

    /// Stable textual form, independent of insertion order.
    ///
    /// Two states that filter identically produce the same string.
    pub fn canonical_query(&self) -> String {
        let mut out = String::new();
        for dim in Dimension::ALL {
            let f = self.get(dim);
            if !f.included.is_empty() {
                let _ = write!(out, "{}={};", dim, join(&f.included));
            }
            if !f.excluded.is_empty() {
                let _ = write!(out, "!{}={};", dim, join(&f.excluded));
            }
        }
        if let Some(min) = self.price.min {
            let _ = write!(out, "price_min={};", min);
        }
        if let Some(max) = self.price.max {
            let _ = write!(out, "price_max={};", max);
        }
        out
    }
}

fn join(values: &BTreeSet<String>) -> String {
    values.iter().cloned().collect::<Vec<_>>().join(",")
}
