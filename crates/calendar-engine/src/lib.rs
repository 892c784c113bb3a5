//! # calendar-engine
//!
//! Working-time calendars for project scheduling.
//!
//! A project owns a set of calendars. Each calendar defines a working week
//! (day types and hours per weekday), may derive from a parent calendar, and
//! may override individual dates with exceptions (optionally recurring) or
//! whole periods with alternative work weeks. On top of that the engine
//! answers the questions a scheduler asks: how much work fits between two
//! instants, and when does a given amount of work finish or need to start.
//!
//! ## Modules
//!
//! - [`calendar`]: project calendar container, inheritance, date resolution and editing
//! - [`calculator`]: work between instants, forward and backward projection, unit conversion
//! - [`days`]: per-weekday day types and working hours
//! - [`week`]: work weeks that replace the regular week for a date range
//! - [`exception`]: date exceptions and the merged exception timeline
//! - [`recurrence`]: daily, weekly, monthly and yearly recurrence rules
//! - [`duration`]: durations, time units and unit conversion
//! - [`range`]: time-of-day and date ranges
//! - [`timeline`]: date-effective value tables (cost rates, availability)
//! - [`properties`]: project-wide defaults
//! - [`error`]: error types
//!
//! ## Example
//!
//! ```
//! use calendar_engine::{Duration, ProjectCalendars, TimeUnit};
//! use chrono::NaiveDate;
//!
//! let mut calendars = ProjectCalendars::new();
//! let standard = calendars.add_default_base_calendar();
//!
//! let christmas = NaiveDate::from_ymd_opt(2024, 12, 25).unwrap();
//! calendars
//!     .calendar_mut(standard)
//!     .unwrap()
//!     .add_calendar_exception(christmas, christmas)
//!     .set_name("Christmas");
//!
//! let calendar = calendars.calendar(standard).unwrap();
//! let start = NaiveDate::from_ymd_opt(2024, 12, 24)
//!     .unwrap()
//!     .and_hms_opt(8, 0, 0)
//!     .unwrap();
//! let finish = calendar
//!     .date_after_work(start, Duration::days(2.0), false)
//!     .unwrap();
//! assert_eq!(finish.to_string(), "2024-12-26 17:00:00");
//! ```

mod cache;

pub mod calculator;
pub mod calendar;
pub mod days;
pub mod duration;
pub mod error;
pub mod exception;
pub mod properties;
pub mod range;
pub mod recurrence;
pub mod timeline;
pub mod week;

pub use calculator::MAX_NONWORKING_DAYS;
pub use calendar::{
    Calendar, CalendarId, CalendarKind, CalendarMut, CalendarRef, ProjectCalendars,
    DEFAULT_BASE_CALENDAR_NAME,
};
pub use days::{CalendarDays, DayType};
pub use duration::{Duration, TimeUnit, TimeUnitDefaults};
pub use error::{CalendarError, Result};
pub use exception::CalendarException;
pub use properties::ProjectProperties;
pub use range::{intersect_ranges, DateRange, LocalDateRange, TimeRange};
pub use recurrence::{RecurrenceRule, RecurrenceType};
pub use timeline::{AvailabilityTable, CostRate, CostRateTable, EffectiveTable};
pub use week::WorkWeek;
