//! Working-time arithmetic on a calendar.
//!
//! - [`CalendarRef::work_between`]: working time between two instants.
//! - [`CalendarRef::date_after_work`]: the instant at which a given amount of
//!   work, started at some instant, is complete.
//! - [`CalendarRef::date_before_work`]: the instant at which work must start
//!   to be complete by a given finish.
//!
//! All day stepping is bounded by [`MAX_NONWORKING_DAYS`], so a calendar with
//! no working time produces an approximate answer instead of looping.
//! Durations are converted to milliseconds using the calendar's resolved
//! minutes per day and week, rounded to a hundredth of a minute. Projected
//! instants are truncated to whole seconds.

use chrono::{Local, NaiveDate, NaiveDateTime, TimeDelta, Timelike, Weekday};
use tracing::{trace, warn};

use crate::cache::Projection;
use crate::calendar::CalendarRef;
use crate::duration::{Duration, TimeUnit};
use crate::error::Result;
use crate::range::{ms_of_day, total_ms, TimeRange, MIDNIGHT, MS_PER_DAY};

/// Longest run of consecutive non-working days stepped over before a
/// calendar is treated as having no working time.
pub const MAX_NONWORKING_DAYS: u32 = 1000;

/// How far back a backward projection may reach when the project has no
/// start date.
const DEFAULT_LOOKBACK_DAYS: i64 = 365;

fn at_ms(date: NaiveDate, ms: i64) -> NaiveDateTime {
    date.and_time(MIDNIGHT) + TimeDelta::milliseconds(ms)
}

fn truncate_to_seconds(instant: NaiveDateTime) -> NaiveDateTime {
    instant.with_nanosecond(0).unwrap_or(instant)
}

fn overlap_total(hours: &[TimeRange], from: i64, to: i64) -> i64 {
    hours.iter().map(|r| r.overlap_ms(from, to)).sum()
}

/// Consume `remaining` milliseconds of the day's ranges from `from` onwards.
/// Returns where the work ends and whether that is the end of a range, or the
/// milliseconds still owed once the day is used up.
fn consume_forward(hours: &[TimeRange], from: i64, mut remaining: i64) -> std::result::Result<(i64, bool), i64> {
    for (start, end) in hours.iter().filter_map(TimeRange::day_bounds) {
        let start = start.max(from);
        if end <= start {
            continue;
        }
        let length = end - start;
        if remaining <= length {
            return Ok((start + remaining, remaining == length));
        }
        remaining -= length;
    }
    Err(remaining)
}

/// Mirror of [`consume_forward`]: consume the day's ranges backwards from
/// `to`, returning where the work starts.
fn consume_backward(hours: &[TimeRange], to: i64, mut remaining: i64) -> std::result::Result<i64, i64> {
    for (start, end) in hours.iter().rev().filter_map(TimeRange::day_bounds) {
        let end = end.min(to);
        if end <= start {
            continue;
        }
        let length = end - start;
        if remaining <= length {
            return Ok(end - remaining);
        }
        remaining -= length;
    }
    Err(remaining)
}

impl<'a> CalendarRef<'a> {
    // ── work between ────────────────────────────────────────────────────

    /// Working time between two instants, negative when `end` precedes
    /// `start`.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::UnsupportedUnit`](crate::CalendarError::UnsupportedUnit)
    /// if `unit` is a percentage.
    ///
    /// # Examples
    ///
    /// ```
    /// use calendar_engine::{ProjectCalendars, TimeUnit};
    /// use chrono::NaiveDate;
    ///
    /// let mut calendars = ProjectCalendars::new();
    /// let id = calendars.add_default_base_calendar();
    /// let calendar = calendars.calendar(id).unwrap();
    ///
    /// let monday = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    /// let work = calendar
    ///     .work_between(
    ///         monday.and_hms_opt(8, 0, 0).unwrap(),
    ///         monday.and_hms_opt(17, 0, 0).unwrap(),
    ///         TimeUnit::Hours,
    ///     )
    ///     .unwrap();
    /// assert_eq!(work.value, 8.0);
    /// ```
    pub fn work_between(&self, start: NaiveDateTime, end: NaiveDateTime, unit: TimeUnit) -> Result<Duration> {
        self.convert_format(self.work_ms(start, end), unit)
    }

    /// Signed working milliseconds between two instants, memoized per pair.
    pub(crate) fn work_ms(&self, start: NaiveDateTime, end: NaiveDateTime) -> i64 {
        let cache = &self.calendar.cache.work;
        if let Some(hit) = cache.get(&(start, end)) {
            trace!(calendar = %self.id(), %start, %end, "work cache hit");
            return hit;
        }

        let (from, to, sign) = if start > end {
            (end, start, -1)
        } else {
            (start, end, 1)
        };

        let total = if from.date() == to.date() {
            overlap_total(
                self.hours_for_date(from.date()),
                ms_of_day(from.time()),
                ms_of_day(to.time()),
            )
        } else {
            let mut total = overlap_total(self.hours_for_date(from.date()), ms_of_day(from.time()), MS_PER_DAY);
            let mut day = from.date().succ_opt();
            while let Some(current) = day.filter(|d| *d < to.date()) {
                total += total_ms(self.hours_for_date(current));
                day = current.succ_opt();
            }
            total + overlap_total(self.hours_for_date(to.date()), 0, ms_of_day(to.time()))
        };

        let signed = sign * total;
        cache.insert((start, end), signed);
        signed
    }

    /// Working time in a typical `day` of the week.
    pub fn work_on_day(&self, day: Weekday, unit: TimeUnit) -> Result<Duration> {
        self.convert_format(total_ms(self.hours(day)), unit)
    }

    /// Working time on `date`, exceptions and work weeks included.
    pub fn work_on_date(&self, date: NaiveDate, unit: TimeUnit) -> Result<Duration> {
        self.convert_format(total_ms(self.hours_for_date(date)), unit)
    }

    /// Number of working dates from `start` to `end` inclusive, in days.
    /// Negative when `end` precedes `start`.
    pub fn working_days(&self, start: NaiveDate, end: NaiveDate) -> Duration {
        let (from, to, sign) = if start > end {
            (end, start, -1.0)
        } else {
            (start, end, 1.0)
        };
        let count = from
            .iter_days()
            .take_while(|d| *d <= to)
            .filter(|d| self.is_working_date(*d))
            .count();
        Duration::days(sign * count as f64)
    }

    /// Express a number of working milliseconds in `unit`, using this
    /// calendar's minutes per day and week.
    pub fn convert_format(&self, ms: i64, unit: TimeUnit) -> Result<Duration> {
        Duration::minutes(ms as f64 / 60_000.0).convert_units(unit, self)
    }

    fn duration_ms(&self, duration: Duration) -> Result<i64> {
        let minutes = duration.convert_units(TimeUnit::Minutes, self)?.value;
        let minutes = (minutes * 100.0).round() / 100.0;
        Ok((minutes * 60_000.0).round() as i64)
    }

    fn add_elapsed(&self, instant: NaiveDateTime, duration: Duration) -> Result<NaiveDateTime> {
        let minutes = duration.convert_units(TimeUnit::ElapsedMinutes, self)?.value;
        Ok(instant + TimeDelta::milliseconds((minutes * 60_000.0).round() as i64))
    }

    // ── forward projection ──────────────────────────────────────────────

    /// The instant at which `duration` of work starting at `start` completes.
    ///
    /// Elapsed durations are added to the wall clock. Negative durations are
    /// projected backwards without a lower bound. When `snap_to_next_work_start`
    /// is set and the work ends exactly at the end of a working period, the
    /// result moves to the start of the next working period.
    ///
    /// If no working time is found within [`MAX_NONWORKING_DAYS`] the result
    /// is one day after `start`.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::UnsupportedUnit`](crate::CalendarError::UnsupportedUnit)
    /// for percentage durations.
    pub fn date_after_work(
        &self,
        start: NaiveDateTime,
        duration: Duration,
        snap_to_next_work_start: bool,
    ) -> Result<NaiveDateTime> {
        if duration.units.is_elapsed() {
            return self.add_elapsed(start, duration);
        }

        let ms = self.duration_ms(duration)?;
        if ms == 0 {
            return Ok(start);
        }
        if ms < 0 {
            let finish = self.walk_backward(start, -ms, None).unwrap_or(start);
            return Ok(truncate_to_seconds(finish));
        }

        let projection = self.project_forward(start, ms);
        let finish = if snap_to_next_work_start && projection.on_boundary {
            self.next_work_start(projection.finish)
        } else {
            projection.finish
        };
        Ok(truncate_to_seconds(finish))
    }

    /// Forward projection. The stored finish is exact; callers truncate.
    fn project_forward(&self, start: NaiveDateTime, ms: i64) -> Projection {
        let cache = &self.calendar.cache;
        let (mut cursor, mut remaining) = (start, ms);

        if let Some(previous) = cache
            .last_projection()
            .filter(|p| p.start == start && ms >= p.work_ms)
        {
            if ms == previous.work_ms {
                trace!(calendar = %self.id(), %start, "reusing previous projection");
                return previous;
            }
            cursor = previous.finish;
            remaining = ms - previous.work_ms;
        }

        match self.walk_forward(cursor, remaining) {
            Some((finish, on_boundary)) => {
                let projection = Projection {
                    start,
                    work_ms: ms,
                    finish,
                    on_boundary,
                };
                cache.set_last_projection(Some(projection));
                projection
            }
            None => {
                warn!(
                    calendar = %self.id(),
                    %start,
                    "no working time within {MAX_NONWORKING_DAYS} days; returning the next day"
                );
                cache.set_last_projection(None);
                Projection {
                    start,
                    work_ms: ms,
                    finish: start + TimeDelta::days(1),
                    on_boundary: false,
                }
            }
        }
    }

    /// Walk forward from `cursor` consuming `remaining` working milliseconds.
    /// `None` when the non-working-day guard trips.
    fn walk_forward(&self, cursor: NaiveDateTime, mut remaining: i64) -> Option<(NaiveDateTime, bool)> {
        let mut date = cursor.date();
        let mut from = ms_of_day(cursor.time());
        loop {
            match consume_forward(self.hours_for_date(date), from, remaining) {
                Ok((end, on_boundary)) => return Some((at_ms(date, end), on_boundary)),
                Err(left) => {
                    remaining = left;
                    date = self.next_working_date(date)?;
                    from = 0;
                }
            }
        }
    }

    /// True when `date` has working time to consume. Ranges with a missing
    /// bound or zero length do not count.
    fn has_work_on(&self, date: NaiveDate) -> bool {
        total_ms(self.hours_for_date(date)) > 0
    }

    fn next_working_date(&self, date: NaiveDate) -> Option<NaiveDate> {
        let mut current = date;
        for _ in 0..MAX_NONWORKING_DAYS {
            current = current.succ_opt()?;
            if self.has_work_on(current) {
                return Some(current);
            }
        }
        None
    }

    // ── backward projection ─────────────────────────────────────────────

    /// The instant at which work must start so that `duration` of it is
    /// complete at `finish`.
    ///
    /// The search stops at the project start date, or one year before now
    /// when the project has none, and returns `None` past that point or when
    /// no working time is found within [`MAX_NONWORKING_DAYS`].
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::UnsupportedUnit`](crate::CalendarError::UnsupportedUnit)
    /// for percentage durations.
    pub fn date_before_work(&self, finish: NaiveDateTime, duration: Duration) -> Result<Option<NaiveDateTime>> {
        self.date_before_work_at(finish, duration, Local::now().naive_local())
    }

    /// [`date_before_work`](Self::date_before_work) with an explicit "now".
    pub fn date_before_work_at(
        &self,
        finish: NaiveDateTime,
        duration: Duration,
        now: NaiveDateTime,
    ) -> Result<Option<NaiveDateTime>> {
        if duration.units.is_elapsed() {
            return self.add_elapsed(finish, duration.negate()).map(Some);
        }

        let ms = self.duration_ms(duration)?;
        if ms == 0 {
            return Ok(Some(finish));
        }
        if ms < 0 {
            return self.date_after_work(finish, duration.negate(), false).map(Some);
        }

        let bound = match self.properties().start_date {
            Some(start) => start.date(),
            None => (now - TimeDelta::days(DEFAULT_LOOKBACK_DAYS)).date(),
        };
        Ok(self.walk_backward(finish, ms, Some(bound)).map(truncate_to_seconds))
    }

    /// Walk backward from `end` consuming `remaining` working milliseconds.
    ///
    /// With a `bound`, stepping to a date before it or tripping the
    /// non-working-day guard yields `None`. Without one, a tripped guard
    /// yields the start of the day before the point reached.
    fn walk_backward(&self, end: NaiveDateTime, mut remaining: i64, bound: Option<NaiveDate>) -> Option<NaiveDateTime> {
        let (mut date, mut to) = if end.time() == MIDNIGHT {
            (end.date().pred_opt()?, MS_PER_DAY)
        } else {
            (end.date(), ms_of_day(end.time()))
        };
        loop {
            match consume_backward(self.hours_for_date(date), to, remaining) {
                Ok(start) => return Some(at_ms(date, start)),
                Err(left) => remaining = left,
            }
            match self.previous_working_date(date, bound) {
                Some(previous) => {
                    date = previous;
                    to = MS_PER_DAY;
                }
                None => {
                    warn!(calendar = %self.id(), %end, ?bound, "backward projection found no working time");
                    return match bound {
                        Some(_) => None,
                        None => date.pred_opt().map(|d| d.and_time(MIDNIGHT)),
                    };
                }
            }
        }
    }

    fn previous_working_date(&self, date: NaiveDate, bound: Option<NaiveDate>) -> Option<NaiveDate> {
        let mut current = date;
        for _ in 0..MAX_NONWORKING_DAYS {
            current = current.pred_opt()?;
            if bound.is_some_and(|b| current < b) {
                return None;
            }
            if self.has_work_on(current) {
                return Some(current);
            }
        }
        None
    }

    // ── work boundaries ─────────────────────────────────────────────────

    /// The earliest instant at or after `instant` at which work is possible.
    /// Returns `instant` unchanged if no working time is found.
    pub fn next_work_start(&self, instant: NaiveDateTime) -> NaiveDateTime {
        let date = instant.date();
        let at = ms_of_day(instant.time());
        let today = self
            .hours_for_date(date)
            .iter()
            .filter_map(TimeRange::day_bounds)
            .find(|(_, end)| at < *end);
        if let Some((start, _)) = today {
            return at_ms(date, start.max(at));
        }

        match self.next_working_date(date) {
            Some(next) => next.and_time(self.start_time(next).unwrap_or(MIDNIGHT)),
            None => {
                warn!(calendar = %self.id(), %instant, "no next working period found");
                instant
            }
        }
    }

    /// The latest instant at or before `instant` at which work could have
    /// finished. Returns `instant` unchanged if no working time is found.
    pub fn previous_work_finish(&self, instant: NaiveDateTime) -> NaiveDateTime {
        let date = instant.date();
        let at = ms_of_day(instant.time());
        let today = self
            .hours_for_date(date)
            .iter()
            .rev()
            .filter_map(TimeRange::day_bounds)
            .find(|(start, _)| *start < at);
        if let Some((_, end)) = today {
            return at_ms(date, end.min(at));
        }

        let previous = self.previous_working_date(date, None).and_then(|d| {
            self.hours_for_date(d)
                .iter()
                .rev()
                .find_map(TimeRange::day_bounds)
                .map(|(_, end)| at_ms(d, end))
        });
        previous.unwrap_or_else(|| {
            warn!(calendar = %self.id(), %instant, "no previous working period found");
            instant
        })
    }
}
