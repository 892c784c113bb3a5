//! Project-wide defaults consulted when a calendar has no value of its own.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::duration::TimeUnitDefaults;
use crate::error::{CalendarError, Result};

/// Project-level settings shared by every calendar in a [`ProjectCalendars`]
/// container.
///
/// Missing fields take their defaults when deserialized, so `{}` is a valid
/// configuration.
///
/// [`ProjectCalendars`]: crate::calendar::ProjectCalendars
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectProperties {
    /// Working minutes in a day. Default 480.
    pub minutes_per_day: u32,
    /// Working minutes in a week. Default 2400.
    pub minutes_per_week: u32,
    /// Working minutes in a month. Default 9600.
    pub minutes_per_month: u32,
    /// Working minutes in a year. Default 115200.
    pub minutes_per_year: u32,
    /// Working days in a month, used to convert months. Default 20.
    pub days_per_month: u32,
    /// Lower bound for backward projection. When unset, one year before the
    /// current time is used instead.
    pub start_date: Option<NaiveDateTime>,
}

impl Default for ProjectProperties {
    fn default() -> Self {
        Self {
            minutes_per_day: 480,
            minutes_per_week: 2400,
            minutes_per_month: 9600,
            minutes_per_year: 115_200,
            days_per_month: 20,
            start_date: None,
        }
    }
}

impl ProjectProperties {
    /// Parse properties from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::InvalidProperties`] if the document is not valid
    /// JSON or a field has the wrong type.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| CalendarError::InvalidProperties(e.to_string()))
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| CalendarError::InvalidProperties(e.to_string()))
    }
}

impl TimeUnitDefaults for ProjectProperties {
    fn minutes_per_day(&self) -> u32 {
        self.minutes_per_day
    }

    fn minutes_per_week(&self) -> u32 {
        self.minutes_per_week
    }

    fn minutes_per_month(&self) -> u32 {
        self.minutes_per_month
    }

    fn minutes_per_year(&self) -> u32 {
        self.minutes_per_year
    }

    fn days_per_month(&self) -> u32 {
        self.days_per_month
    }
}
