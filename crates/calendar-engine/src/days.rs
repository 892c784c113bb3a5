//! Per-day-of-week definition shared by calendars and work weeks.

use std::sync::LazyLock;

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use crate::range::TimeRange;

/// Days of the week, Monday first. Index matches [`Weekday::num_days_from_monday`].
pub const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Standard morning shift.
pub fn default_working_morning() -> TimeRange {
    TimeRange::from_hm((8, 0), (12, 0))
}

/// Standard afternoon shift.
pub fn default_working_afternoon() -> TimeRange {
    TimeRange::from_hm((13, 0), (17, 0))
}

/// Both standard shifts. A working day that has no hours of its own and
/// nothing to inherit from is worked on these.
pub(crate) static DEFAULT_WORKING_HOURS: LazyLock<[TimeRange; 2]> =
    LazyLock::new(|| [default_working_morning(), default_working_afternoon()]);

/// Whether a day is worked, not worked, or inherited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayType {
    NonWorking,
    Working,
    /// Take the value from the parent calendar. With no parent, Saturday and
    /// Sunday are non-working and every other day is working.
    Default,
}

impl DayType {
    /// Fallback used when a `Default` day has nowhere to inherit from.
    pub fn weekday_fallback(day: Weekday) -> DayType {
        match day {
            Weekday::Sat | Weekday::Sun => DayType::NonWorking,
            _ => DayType::Working,
        }
    }
}

/// Day types and working hours for each day of the week.
///
/// Hours are `None` when never set for a day, which lets a derived calendar
/// inherit them, and `Some(vec![])` when explicitly empty. Calendars treat
/// empty hours on a working day the same as unset ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarDays {
    types: [DayType; 7],
    hours: [Option<Vec<TimeRange>>; 7],
}

impl Default for CalendarDays {
    fn default() -> Self {
        Self {
            types: [DayType::Default; 7],
            hours: Default::default(),
        }
    }
}

fn index(day: Weekday) -> usize {
    day.num_days_from_monday() as usize
}

impl CalendarDays {
    /// Every day `Default`, no hours.
    pub fn new() -> Self {
        Self::default()
    }

    /// Monday to Friday working 08:00-12:00 and 13:00-17:00, weekend non-working.
    pub fn standard() -> Self {
        let mut days = Self::new();
        for day in WEEK {
            days.set_day_type(day, DayType::weekday_fallback(day));
        }
        days.add_default_calendar_hours();
        days
    }

    /// Day type as set, possibly `Default`.
    pub fn day_type(&self, day: Weekday) -> DayType {
        self.types[index(day)]
    }

    pub fn set_day_type(&mut self, day: Weekday, day_type: DayType) {
        self.types[index(day)] = day_type;
    }

    /// Set `day` to `Working` or `NonWorking`.
    pub fn set_working_day(&mut self, day: Weekday, working: bool) {
        let day_type = if working {
            DayType::Working
        } else {
            DayType::NonWorking
        };
        self.set_day_type(day, day_type);
    }

    /// Hours set directly on this definition, if any.
    pub fn hours(&self, day: Weekday) -> Option<&[TimeRange]> {
        self.hours[index(day)].as_deref()
    }

    /// Add a working period, keeping the day's ranges in order.
    pub fn add_calendar_hours(&mut self, day: Weekday, range: TimeRange) {
        let ranges = self.hours[index(day)].get_or_insert_with(Vec::new);
        ranges.push(range);
        ranges.sort();
    }

    /// Replace the hours of `day`, sorting them by start.
    pub fn set_calendar_hours(&mut self, day: Weekday, mut ranges: Vec<TimeRange>) {
        ranges.sort();
        self.hours[index(day)] = Some(ranges);
    }

    /// Forget the day's hours so they are inherited again.
    pub fn remove_calendar_hours(&mut self, day: Weekday) -> Option<Vec<TimeRange>> {
        self.hours[index(day)].take()
    }

    /// Set the standard shifts on weekdays and explicitly empty hours on the
    /// weekend.
    pub fn add_default_calendar_hours(&mut self) {
        for day in WEEK {
            let ranges = match day {
                Weekday::Sat | Weekday::Sun => Vec::new(),
                _ => vec![default_working_morning(), default_working_afternoon()],
            };
            self.set_calendar_hours(day, ranges);
        }
    }
}
