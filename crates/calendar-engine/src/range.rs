//! Interval primitives used throughout the engine.
//!
//! - [`TimeRange`] is a time-of-day interval. An end of midnight means "runs to
//!   the end of the day", so `08:00-00:00` covers sixteen hours and `00:00-00:00`
//!   covers the whole day. An end earlier than the start spans midnight.
//! - [`DateRange`] and [`LocalDateRange`] are closed intervals over instants and
//!   dates, with a three-way point comparison used by binary search.

use std::cmp::Ordering;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike};
use serde::{Deserialize, Serialize};

/// Milliseconds in a calendar day.
pub const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Midnight, the start of a day and the end-of-day sentinel for range ends.
pub const MIDNIGHT: NaiveTime = NaiveTime::MIN;

/// Milliseconds elapsed since midnight.
pub(crate) fn ms_of_day(time: NaiveTime) -> i64 {
    time.num_seconds_from_midnight() as i64 * 1000 + (time.nanosecond() / 1_000_000) as i64
}

/// Time of day from milliseconds since midnight. Values at or past a full day
/// wrap to midnight.
pub(crate) fn time_from_ms(ms: i64) -> NaiveTime {
    let ms = ms.rem_euclid(MS_PER_DAY);
    MIDNIGHT + TimeDelta::milliseconds(ms)
}

/// Build a time of day from hours and minutes. Out-of-range input yields midnight.
pub(crate) fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(MIDNIGHT)
}

// ── TimeRange ───────────────────────────────────────────────────────────────

/// A working period within a single day.
///
/// Either bound may be absent. A range with a missing bound contributes no
/// working time. Ordering is by start, then end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeRange {
    start: Option<NaiveTime>,
    end: Option<NaiveTime>,
}

impl TimeRange {
    /// A range from `start` to `end`. An `end` of midnight runs to the end of
    /// the day; an `end` before `start` crosses midnight.
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    /// A range whose bounds may be missing.
    pub fn with_bounds(start: Option<NaiveTime>, end: Option<NaiveTime>) -> Self {
        Self { start, end }
    }

    /// Convenience constructor from `(hour, minute)` pairs.
    pub fn from_hm(start: (u32, u32), end: (u32, u32)) -> Self {
        Self::new(hm(start.0, start.1), hm(end.0, end.1))
    }

    /// Start of the range, if set.
    pub fn start(&self) -> Option<NaiveTime> {
        self.start
    }

    /// End of the range, if set. Midnight means the end of the day.
    pub fn end(&self) -> Option<NaiveTime> {
        self.end
    }

    /// True when the range runs to the end of the day.
    pub fn ends_at_midnight(&self) -> bool {
        self.end == Some(MIDNIGHT)
    }

    /// Full length of the range, including any part after midnight.
    pub fn duration(&self) -> TimeDelta {
        let (Some(start), Some(end)) = (self.start, self.end) else {
            return TimeDelta::zero();
        };
        let (start, end) = (ms_of_day(start), ms_of_day(end));
        let length = if end == 0 || end < start {
            end + MS_PER_DAY - start
        } else {
            end - start
        };
        TimeDelta::milliseconds(length)
    }

    /// The part of this range that lies within its own day, as milliseconds
    /// since midnight.
    ///
    /// A midnight end maps to [`MS_PER_DAY`]. A range spanning midnight is
    /// clipped at the end of the day. Returns `None` for ranges with a missing
    /// bound or zero length.
    pub fn day_bounds(&self) -> Option<(i64, i64)> {
        let (start, end) = (ms_of_day(self.start?), ms_of_day(self.end?));
        let end = if end == 0 || end < start {
            MS_PER_DAY
        } else {
            end
        };
        (end > start).then_some((start, end))
    }

    /// Milliseconds of this range that fall within `[from, to)`, both given as
    /// milliseconds since midnight.
    pub(crate) fn overlap_ms(&self, from: i64, to: i64) -> i64 {
        match self.day_bounds() {
            Some((start, end)) => (end.min(to) - start.max(from)).max(0),
            None => 0,
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |t: Option<NaiveTime>| t.map(|t| t.format("%H:%M").to_string());
        write!(
            f,
            "[{}-{}]",
            show(self.start).unwrap_or_else(|| "?".into()),
            show(self.end).unwrap_or_else(|| "?".into())
        )
    }
}

/// Total in-day working time of a list of ranges, in milliseconds.
pub fn total_ms(ranges: &[TimeRange]) -> i64 {
    ranges.iter().map(|r| r.overlap_ms(0, MS_PER_DAY)).sum()
}

/// Working time common to two lists of ranges.
///
/// Both lists are taken in start order. Each overlap between a range of `a`
/// and a range of `b` becomes one range of the result; ranges with a missing
/// bound or zero length never overlap anything.
pub fn intersect_ranges(a: &[TimeRange], b: &[TimeRange]) -> Vec<TimeRange> {
    let bounds = |ranges: &[TimeRange]| {
        let mut bounds: Vec<_> = ranges.iter().filter_map(TimeRange::day_bounds).collect();
        bounds.sort();
        bounds
    };
    let (left, right) = (bounds(a), bounds(b));
    let (mut i, mut j) = (0, 0);
    let mut common = Vec::new();
    while let (Some(&(start_a, end_a)), Some(&(start_b, end_b))) = (left.get(i), right.get(j)) {
        let start = start_a.max(start_b);
        let end = if end_a < end_b {
            i += 1;
            end_a
        } else {
            j += 1;
            end_b
        };
        if end > start {
            common.push(TimeRange::new(time_from_ms(start), time_from_ms(end)));
        }
    }
    common
}

// ── DateRange ───────────────────────────────────────────────────────────────

/// A closed interval between two instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DateRange {
    /// First instant in the range.
    pub start: NaiveDateTime,
    /// Last instant in the range, inclusive.
    pub end: NaiveDateTime,
}

impl DateRange {
    /// A range from `start` to `end`, taken as given.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    /// Where this range lies relative to `point`.
    ///
    /// `Greater` when the range starts after the point, `Less` when it ends
    /// before the point, `Equal` when the point is inside (bounds included).
    pub fn compare_point(&self, point: NaiveDateTime) -> Ordering {
        if point < self.start {
            Ordering::Greater
        } else if point > self.end {
            Ordering::Less
        } else {
            Ordering::Equal
        }
    }

    /// True when `point` lies within the range, bounds included.
    pub fn contains(&self, point: NaiveDateTime) -> bool {
        self.compare_point(point) == Ordering::Equal
    }
}

/// A closed interval between two dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LocalDateRange {
    /// First date in the range.
    pub start: NaiveDate,
    /// Last date in the range, inclusive.
    pub end: NaiveDate,
}

impl LocalDateRange {
    /// Builds the range, swapping the bounds if they are reversed.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        if end < start {
            Self {
                start: end,
                end: start,
            }
        } else {
            Self { start, end }
        }
    }

    /// Same contract as [`DateRange::compare_point`].
    pub fn compare_point(&self, date: NaiveDate) -> Ordering {
        if date < self.start {
            Ordering::Greater
        } else if date > self.end {
            Ordering::Less
        } else {
            Ordering::Equal
        }
    }

    /// True when `date` lies within the range, bounds included.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.compare_point(date) == Ordering::Equal
    }

    /// The range as instants from the start of the first day to the last
    /// millisecond of the last day.
    pub fn to_date_range(&self) -> DateRange {
        let end = self.end.and_time(MIDNIGHT) + TimeDelta::milliseconds(MS_PER_DAY - 1);
        DateRange::new(self.start.and_time(MIDNIGHT), end)
    }
}

impl fmt::Display for LocalDateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} - {}]", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // ── TimeRange tests ─────────────────────────────────────────────────

    #[test]
    fn test_simple_range_duration() {
        let range = TimeRange::from_hm((8, 0), (12, 0));
        assert_eq!(range.duration(), TimeDelta::hours(4));
        assert_eq!(range.day_bounds(), Some((8 * 3_600_000, 12 * 3_600_000)));
    }

    #[test]
    fn test_midnight_end_runs_to_end_of_day() {
        let range = TimeRange::from_hm((8, 30), (0, 0));
        assert!(range.ends_at_midnight());
        assert_eq!(range.duration(), TimeDelta::minutes(15 * 60 + 30));
        assert_eq!(range.day_bounds().unwrap().1, MS_PER_DAY);
    }

    #[test]
    fn test_whole_day_range() {
        let range = TimeRange::from_hm((0, 0), (0, 0));
        assert_eq!(range.duration(), TimeDelta::hours(24));
        assert_eq!(total_ms(&[range]), MS_PER_DAY);
    }

    #[test]
    fn test_zero_length_range_is_not_whole_day() {
        let range = TimeRange::from_hm((9, 0), (9, 0));
        assert_eq!(range.duration(), TimeDelta::zero());
        assert_eq!(range.day_bounds(), None);
    }

    #[test]
    fn test_range_spanning_midnight() {
        let range = TimeRange::from_hm((22, 0), (2, 0));
        assert_eq!(range.duration(), TimeDelta::hours(4));
        // only the part before midnight belongs to this day
        assert_eq!(total_ms(&[range]), 2 * 3_600_000);
    }

    #[test]
    fn test_missing_bound_contributes_nothing() {
        let range = TimeRange::with_bounds(Some(hm(8, 0)), None);
        assert_eq!(range.duration(), TimeDelta::zero());
        assert_eq!(range.overlap_ms(0, MS_PER_DAY), 0);
    }

    #[test]
    fn test_overlap_clips_to_window() {
        let range = TimeRange::from_hm((8, 0), (12, 0));
        let from = ms_of_day(hm(9, 30));
        let to = ms_of_day(hm(17, 0));
        assert_eq!(range.overlap_ms(from, to), 150 * 60_000);
        assert_eq!(range.overlap_ms(ms_of_day(hm(13, 0)), MS_PER_DAY), 0);
    }

    #[test]
    fn test_time_range_ordering() {
        let mut ranges = vec![
            TimeRange::from_hm((13, 0), (17, 0)),
            TimeRange::from_hm((8, 0), (12, 0)),
            TimeRange::from_hm((8, 0), (10, 0)),
        ];
        ranges.sort();
        assert_eq!(ranges[0], TimeRange::from_hm((8, 0), (10, 0)));
        assert_eq!(ranges[2], TimeRange::from_hm((13, 0), (17, 0)));
    }

    #[test]
    fn test_time_from_ms_wraps() {
        assert_eq!(time_from_ms(MS_PER_DAY), MIDNIGHT);
        assert_eq!(time_from_ms(ms_of_day(hm(16, 45))), hm(16, 45));
    }

    #[test]
    fn test_time_range_display() {
        assert_eq!(TimeRange::from_hm((8, 0), (12, 0)).to_string(), "[08:00-12:00]");
        assert_eq!(TimeRange::with_bounds(None, None).to_string(), "[?-?]");
    }

    #[test]
    fn test_intersect_ranges() {
        let task = [TimeRange::from_hm((8, 0), (12, 0)), TimeRange::from_hm((13, 0), (17, 0))];
        let resource = [TimeRange::from_hm((10, 0), (15, 0))];
        assert_eq!(
            intersect_ranges(&task, &resource),
            vec![TimeRange::from_hm((10, 0), (12, 0)), TimeRange::from_hm((13, 0), (15, 0))]
        );
        assert_eq!(intersect_ranges(&resource, &task), intersect_ranges(&task, &resource));
    }

    #[test]
    fn test_intersect_ranges_edges() {
        let evening = [TimeRange::from_hm((16, 0), (0, 0))];
        let late = [TimeRange::from_hm((20, 0), (0, 0))];
        // a shared midnight end stays a midnight end
        assert_eq!(intersect_ranges(&evening, &late), vec![TimeRange::from_hm((20, 0), (0, 0))]);

        // touching ranges share nothing
        let morning = [TimeRange::from_hm((8, 0), (12, 0))];
        let afternoon = [TimeRange::from_hm((12, 0), (17, 0))];
        assert!(intersect_ranges(&morning, &afternoon).is_empty());

        let broken = [TimeRange::with_bounds(Some(hm(8, 0)), None), TimeRange::from_hm((9, 0), (9, 0))];
        assert!(intersect_ranges(&broken, &morning).is_empty());
        assert!(intersect_ranges(&[], &morning).is_empty());
    }

    // ── DateRange tests ─────────────────────────────────────────────────

    #[test]
    fn test_local_date_range_compare_point() {
        let range = LocalDateRange::new(date(2024, 3, 1), date(2024, 3, 10));
        assert_eq!(range.compare_point(date(2024, 2, 28)), Ordering::Greater);
        assert_eq!(range.compare_point(date(2024, 3, 1)), Ordering::Equal);
        assert_eq!(range.compare_point(date(2024, 3, 10)), Ordering::Equal);
        assert_eq!(range.compare_point(date(2024, 3, 11)), Ordering::Less);
    }

    #[test]
    fn test_local_date_range_swaps_reversed_bounds() {
        let range = LocalDateRange::new(date(2024, 3, 10), date(2024, 3, 1));
        assert_eq!(range.start, date(2024, 3, 1));
        assert!(range.contains(date(2024, 3, 5)));
    }

    #[test]
    fn test_date_range_contains_bounds() {
        let range = LocalDateRange::new(date(2024, 3, 1), date(2024, 3, 1)).to_date_range();
        assert!(range.contains(date(2024, 3, 1).and_hms_opt(0, 0, 0).unwrap()));
        assert!(range.contains(date(2024, 3, 1).and_hms_opt(23, 59, 59).unwrap()));
        assert!(!range.contains(date(2024, 3, 2).and_hms_opt(0, 0, 0).unwrap()));
    }

    #[test]
    fn test_date_range_ordering() {
        let a = LocalDateRange::new(date(2024, 1, 1), date(2024, 1, 5));
        let b = LocalDateRange::new(date(2024, 1, 1), date(2024, 1, 9));
        let c = LocalDateRange::new(date(2024, 1, 2), date(2024, 1, 3));
        let mut ranges = vec![c, b, a];
        ranges.sort();
        assert_eq!(ranges, vec![a, b, c]);
    }
}
