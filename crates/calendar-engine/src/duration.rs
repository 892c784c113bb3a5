//! Durations tagged with a time unit, and conversion between units.
//!
//! Working units (days, weeks, months, years) depend on how many minutes a
//! calendar or project counts per day and per week, supplied through
//! [`TimeUnitDefaults`]. Elapsed units use fixed wall-clock lengths: a 24 hour
//! day, a 7 day week, a 30 day month and a 52 week year.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CalendarError, Result};

/// Tolerance used when comparing duration magnitudes.
const EPSILON: f64 = 0.00001;

// ── TimeUnit ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeUnit {
    Minutes,
    Hours,
    Days,
    Weeks,
    Months,
    Years,
    Percent,
    ElapsedMinutes,
    ElapsedHours,
    ElapsedDays,
    ElapsedWeeks,
    ElapsedMonths,
    ElapsedYears,
    ElapsedPercent,
}

impl TimeUnit {
    /// True for units measured against the wall clock rather than a calendar.
    pub fn is_elapsed(self) -> bool {
        matches!(
            self,
            TimeUnit::ElapsedMinutes
                | TimeUnit::ElapsedHours
                | TimeUnit::ElapsedDays
                | TimeUnit::ElapsedWeeks
                | TimeUnit::ElapsedMonths
                | TimeUnit::ElapsedYears
                | TimeUnit::ElapsedPercent
        )
    }

    /// True for the percentage units, which have no conversion.
    pub fn is_percent(self) -> bool {
        matches!(self, TimeUnit::Percent | TimeUnit::ElapsedPercent)
    }

    /// Minutes in one of this unit, or `None` for percentages.
    fn minutes(self, defaults: &(impl TimeUnitDefaults + ?Sized)) -> Option<f64> {
        let per_day = defaults.minutes_per_day() as f64;
        let per_week = defaults.minutes_per_week() as f64;
        let value = match self {
            TimeUnit::Minutes | TimeUnit::ElapsedMinutes => 1.0,
            TimeUnit::Hours | TimeUnit::ElapsedHours => 60.0,
            TimeUnit::Days => per_day,
            TimeUnit::Weeks => per_week,
            TimeUnit::Months => per_day * defaults.days_per_month() as f64,
            TimeUnit::Years => per_week * 52.0,
            TimeUnit::ElapsedDays => 1440.0,
            TimeUnit::ElapsedWeeks => 10080.0,
            TimeUnit::ElapsedMonths => 43200.0,
            TimeUnit::ElapsedYears => 10080.0 * 52.0,
            TimeUnit::Percent | TimeUnit::ElapsedPercent => return None,
        };
        Some(value)
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TimeUnit::Minutes => "m",
            TimeUnit::Hours => "h",
            TimeUnit::Days => "d",
            TimeUnit::Weeks => "w",
            TimeUnit::Months => "mo",
            TimeUnit::Years => "y",
            TimeUnit::Percent => "%",
            TimeUnit::ElapsedMinutes => "em",
            TimeUnit::ElapsedHours => "eh",
            TimeUnit::ElapsedDays => "ed",
            TimeUnit::ElapsedWeeks => "ew",
            TimeUnit::ElapsedMonths => "emo",
            TimeUnit::ElapsedYears => "ey",
            TimeUnit::ElapsedPercent => "e%",
        };
        f.write_str(s)
    }
}

// ── TimeUnitDefaults ────────────────────────────────────────────────────────

/// Source of the minutes-per-unit figures needed to convert working units.
pub trait TimeUnitDefaults {
    fn minutes_per_day(&self) -> u32;
    fn minutes_per_week(&self) -> u32;
    fn minutes_per_month(&self) -> u32;
    fn minutes_per_year(&self) -> u32;
    fn days_per_month(&self) -> u32;
}

// ── Duration ────────────────────────────────────────────────────────────────

/// A magnitude paired with the unit it is expressed in.
///
/// Equality compares the unit exactly and the magnitude within `0.00001`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Duration {
    /// Magnitude, possibly negative or fractional.
    pub value: f64,
    /// Unit the magnitude is expressed in.
    pub units: TimeUnit,
}

impl Duration {
    pub fn new(value: f64, units: TimeUnit) -> Self {
        Self { value, units }
    }

    /// A duration in working minutes.
    pub fn minutes(value: f64) -> Self {
        Self::new(value, TimeUnit::Minutes)
    }

    /// A duration in working hours.
    pub fn hours(value: f64) -> Self {
        Self::new(value, TimeUnit::Hours)
    }

    /// A duration in working days.
    pub fn days(value: f64) -> Self {
        Self::new(value, TimeUnit::Days)
    }

    pub fn zero(units: TimeUnit) -> Self {
        Self::new(0.0, units)
    }

    /// True when the magnitude is zero within the equality tolerance.
    pub fn is_zero(&self) -> bool {
        self.value.abs() < EPSILON
    }

    /// Same duration with the sign flipped.
    pub fn negate(self) -> Self {
        Self::new(-self.value, self.units)
    }

    /// Express this duration in another unit.
    ///
    /// Working units are converted with the figures from `defaults`. When a
    /// divisor is zero the result is zero rather than an error.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::UnsupportedUnit`] when exactly one side is a
    /// percentage, or both are different percentage units.
    ///
    /// # Examples
    ///
    /// ```
    /// use calendar_engine::{Duration, ProjectProperties, TimeUnit};
    ///
    /// let defaults = ProjectProperties::default();
    /// let days = Duration::hours(12.0).convert_units(TimeUnit::Days, &defaults).unwrap();
    /// assert_eq!(days, Duration::days(1.5));
    /// ```
    pub fn convert_units(
        self,
        to: TimeUnit,
        defaults: &(impl TimeUnitDefaults + ?Sized),
    ) -> Result<Duration> {
        if self.units == to {
            return Ok(self);
        }

        let unsupported = CalendarError::UnsupportedUnit {
            from: self.units,
            to,
        };
        let from_minutes = self.units.minutes(defaults).ok_or(unsupported.clone())?;
        let to_minutes = to.minutes(defaults).ok_or(unsupported)?;

        let minutes = self.value * from_minutes;
        let value = if to_minutes == 0.0 {
            0.0
        } else {
            minutes / to_minutes
        };
        Ok(Duration::new(value, to))
    }
}

impl PartialEq for Duration {
    fn eq(&self, other: &Self) -> bool {
        self.units == other.units && (self.value - other.value).abs() < EPSILON
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}{}", self.value, self.units)
    }
}
