//! Calendar exceptions and the merged, date-sorted exception timeline.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::range::{LocalDateRange, TimeRange};
use crate::recurrence::{RecurrenceRule, RecurrenceType};

/// Order in which recurring exceptions are laid down. A kind later in the list
/// replaces an earlier kind on a shared date.
const EXPANSION_ORDER: [RecurrenceType; 4] = [
    RecurrenceType::Weekly,
    RecurrenceType::Monthly,
    RecurrenceType::Yearly,
    RecurrenceType::Daily,
];

/// Replacement working hours for a span of dates.
///
/// An exception with no hours makes its dates non-working. A recurring
/// exception covers the dates its rule generates; its bounds are the first
/// and last of those dates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarException {
    from: NaiveDate,
    to: NaiveDate,
    name: Option<String>,
    recurrence: Option<RecurrenceRule>,
    hours: Vec<TimeRange>,
}

impl CalendarException {
    /// A non-working exception covering `from` to `to` inclusive.
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        let range = LocalDateRange::new(from, to);
        Self {
            from: range.start,
            to: range.end,
            name: None,
            recurrence: None,
            hours: Vec::new(),
        }
    }

    /// A non-working exception on the dates generated by `rule`.
    pub fn recurring(rule: RecurrenceRule) -> Self {
        let start = rule.start_date();
        Self {
            from: start,
            to: start,
            name: None,
            recurrence: Some(rule),
            hours: Vec::new(),
        }
    }

    /// First date covered. For a recurring exception, the first generated
    /// date, or the rule's start date if it generates none.
    pub fn from(&self) -> NaiveDate {
        match &self.recurrence {
            Some(rule) => rule.first_date().unwrap_or(rule.start_date()),
            None => self.from,
        }
    }

    /// Last date covered, inclusive. For a recurring exception, the last
    /// generated date.
    pub fn to(&self) -> NaiveDate {
        match &self.recurrence {
            Some(rule) => rule.last_date().unwrap_or(rule.start_date()),
            None => self.to,
        }
    }

    pub fn date_range(&self) -> LocalDateRange {
        LocalDateRange::new(self.from(), self.to())
    }

    /// True when `date` lies between [`from`](Self::from) and
    /// [`to`](Self::to). Gaps between recurring occurrences count as inside.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.date_range().contains(date)
    }

    /// Set the covered dates, swapping them if reversed.
    pub fn set_dates(&mut self, from: NaiveDate, to: NaiveDate) -> &mut Self {
        let range = LocalDateRange::new(from, to);
        self.from = range.start;
        self.to = range.end;
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = Some(name.into());
        self
    }

    /// The recurrence rule, if this exception repeats.
    pub fn recurrence(&self) -> Option<&RecurrenceRule> {
        self.recurrence.as_ref()
    }

    pub fn recurrence_mut(&mut self) -> Option<&mut RecurrenceRule> {
        self.recurrence.as_mut()
    }

    /// Make the exception recurring, or single with `None`.
    pub fn set_recurrence(&mut self, rule: Option<RecurrenceRule>) -> &mut Self {
        self.recurrence = rule;
        self
    }

    pub fn is_recurring(&self) -> bool {
        self.recurrence.is_some()
    }

    /// Working periods on each covered date. Empty for a non-working
    /// exception.
    pub fn hours(&self) -> &[TimeRange] {
        &self.hours
    }

    /// Add a working period, keeping the ranges in order.
    pub fn add_range(&mut self, range: TimeRange) -> &mut Self {
        self.hours.push(range);
        self.hours.sort();
        self
    }

    /// Replace the working periods.
    pub fn set_hours(&mut self, mut hours: Vec<TimeRange>) -> &mut Self {
        hours.sort();
        self.hours = hours;
        self
    }

    /// True when the exception has any working periods.
    pub fn is_working(&self) -> bool {
        !self.hours.is_empty()
    }

    /// A single-day, non-recurring copy of this exception on `date`.
    fn occurrence(&self, date: NaiveDate) -> CalendarException {
        CalendarException {
            from: date,
            to: date,
            name: self.name.clone(),
            recurrence: None,
            hours: self.hours.clone(),
        }
    }

    /// One single-day exception per date the rule generates. A non-recurring
    /// exception expands to itself.
    pub fn expand(&self, is_working: &dyn Fn(NaiveDate) -> bool) -> Vec<CalendarException> {
        match &self.recurrence {
            Some(rule) => rule
                .dates_with(is_working)
                .into_iter()
                .map(|date| self.occurrence(date))
                .collect(),
            None => vec![self.clone()],
        }
    }
}

/// Merge `exceptions` into one list sorted by start date with no recurring
/// entries.
///
/// Recurring exceptions are expanded kind by kind (weekly, monthly, yearly,
/// then daily), each kind overwriting earlier kinds on a shared date.
/// Non-recurring exceptions are applied last and replace every expanded
/// occurrence inside their range. `is_working` decides which days count for
/// "working days only" daily rules.
pub fn expand_exceptions(
    exceptions: &[CalendarException],
    is_working: &dyn Fn(NaiveDate) -> bool,
) -> Vec<CalendarException> {
    let mut timeline: BTreeMap<NaiveDate, CalendarException> = BTreeMap::new();

    for kind in EXPANSION_ORDER {
        let of_kind = exceptions
            .iter()
            .filter(|e| e.recurrence().map(|r| r.recurrence_type()) == Some(kind));
        for exception in of_kind {
            for occurrence in exception.expand(is_working) {
                timeline.insert(occurrence.from, occurrence);
            }
        }
    }

    for exception in exceptions.iter().filter(|e| !e.is_recurring()) {
        let range = exception.date_range();
        timeline.retain(|date, _| !range.contains(*date));
        timeline.insert(range.start, exception.clone());
    }

    timeline.into_values().collect()
}

/// Binary search a sorted, expanded timeline for the exception covering `date`.
pub fn find_exception(timeline: &[CalendarException], date: NaiveDate) -> Option<&CalendarException> {
    timeline
        .binary_search_by(|e| e.date_range().compare_point(date))
        .ok()
        .map(|index| &timeline[index])
}
