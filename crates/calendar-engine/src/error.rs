//! Error types for calendar-engine operations.

use thiserror::Error;

use crate::calendar::CalendarId;
use crate::duration::TimeUnit;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalendarError {
    #[error("Cannot convert {from} to {to}")]
    UnsupportedUnit { from: TimeUnit, to: TimeUnit },

    #[error("Unknown calendar: {0}")]
    UnknownCalendar(CalendarId),

    #[error("Setting {parent} as parent of {calendar} would create a cycle")]
    ParentCycle {
        calendar: CalendarId,
        parent: CalendarId,
    },

    #[error("Invalid project properties: {0}")]
    InvalidProperties(String),
}

pub type Result<T> = std::result::Result<T, CalendarError>;
