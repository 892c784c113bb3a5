//! Values that change over time, such as resource cost rates and
//! availability.
//!
//! An [`EffectiveTable`] holds consecutive `(range, value)` entries ordered by
//! range. Lookups scan forward and take the first entry whose range ends at
//! or after the point in question, so a point falling in a gap between
//! entries resolves to the next entry.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::range::DateRange;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectiveTable<T> {
    entries: Vec<(DateRange, T)>,
}

impl<T> Default for EffectiveTable<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T> EffectiveTable<T> {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry, keeping entries ordered by range.
    pub fn push(&mut self, range: DateRange, value: T) -> &mut Self {
        let index = self.entries.partition_point(|(r, _)| *r <= range);
        self.entries.insert(index, (range, value));
        self
    }

    /// Index of the entry in effect at `instant`.
    pub fn index_at(&self, instant: NaiveDateTime) -> Option<usize> {
        self.entries.iter().position(|(range, _)| range.end >= instant)
    }

    /// The entry in effect at `instant`.
    pub fn entry_at(&self, instant: NaiveDateTime) -> Option<&(DateRange, T)> {
        self.index_at(instant).map(|index| &self.entries[index])
    }

    /// The value in effect at `instant`.
    pub fn value_at(&self, instant: NaiveDateTime) -> Option<&T> {
        self.entry_at(instant).map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in date order.
    pub fn iter(&self) -> impl Iterator<Item = &(DateRange, T)> {
        self.entries.iter()
    }
}

/// Rates charged for a resource while an entry is in effect.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CostRate {
    /// Cost per hour of regular work.
    pub standard_rate: f64,
    /// Cost per hour of overtime work.
    pub overtime_rate: f64,
    /// Fixed cost each time the resource is assigned.
    pub cost_per_use: f64,
}

pub type CostRateTable = EffectiveTable<CostRate>;

/// Units of a resource available over time, `1.0` meaning one full resource.
pub type AvailabilityTable = EffectiveTable<f64>;
