//! Date-bounded overlays of a calendar's weekly hours.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::days::CalendarDays;
use crate::range::LocalDateRange;

/// A work week replaces the calendar's weekly definition for the dates in its
/// range. A week without a range describes the calendar's own default week
/// and never acts as an overlay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkWeek {
    name: Option<String>,
    range: Option<LocalDateRange>,
    days: CalendarDays,
}

impl WorkWeek {
    /// An unnamed overlay with every day `Default`, valid over `range`.
    pub fn new(range: Option<LocalDateRange>) -> Self {
        Self {
            name: None,
            range,
            days: CalendarDays::new(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = Some(name.into());
        self
    }

    /// Dates the overlay applies to. `None` never matches a date.
    pub fn date_range(&self) -> Option<LocalDateRange> {
        self.range
    }

    /// True when this week is an overlay covering `date`.
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.range.is_some_and(|r| r.contains(date))
    }

    /// Weekly definition used inside the range.
    pub fn days(&self) -> &CalendarDays {
        &self.days
    }

    pub fn days_mut(&mut self) -> &mut CalendarDays {
        &mut self.days
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::days::DayType;
    use chrono::Weekday;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_week_without_range_covers_nothing() {
        let week = WorkWeek::new(None);
        assert!(!week.covers(date(2024, 1, 1)));
    }

    #[test]
    fn test_week_covers_its_range() {
        let mut week = WorkWeek::new(Some(LocalDateRange::new(date(2024, 7, 1), date(2024, 8, 31))));
        week.set_name("Summer hours")
            .days_mut()
            .set_day_type(Weekday::Fri, DayType::NonWorking);
        assert!(week.covers(date(2024, 7, 1)));
        assert!(week.covers(date(2024, 8, 31)));
        assert!(!week.covers(date(2024, 9, 1)));
        assert_eq!(week.name(), Some("Summer hours"));
        assert_eq!(week.days().day_type(Weekday::Fri), DayType::NonWorking);
    }
}
