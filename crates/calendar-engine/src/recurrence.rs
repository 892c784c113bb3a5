//! Recurrence rules and their expansion into concrete dates.
//!
//! A [`RecurrenceRule`] describes a repeating pattern anchored at a start date
//! and terminated either by a finish date or by an occurrence count. The finish
//! date wins when both are present; with neither, a single occurrence is
//! produced.
//!
//! # Patterns
//!
//! - **Daily**: every `frequency` days, or every `frequency` working days when
//!   `working_days_only` is set.
//! - **Weekly**: the flagged weekdays of every `frequency`-th week. Weeks run
//!   Sunday to Saturday and flagged days before the start date are skipped.
//! - **Monthly**: a fixed day of the month (clamped to the month's length), or
//!   the nth weekday of the month when `relative` is set, every `frequency`
//!   months.
//! - **Yearly**: like monthly, in a fixed month, every year.
//!
//! For relative patterns the day number is an ordinal: 1 to 4 select the
//! first to fourth occurrence of the weekday, 5 or more selects the last.

use std::fmt;
use std::sync::OnceLock;

use chrono::{Datelike, Months, NaiveDate, TimeDelta, Weekday};
use serde::{Deserialize, Serialize};

use crate::calculator::MAX_NONWORKING_DAYS;
use crate::days::{DayType, WEEK};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurrenceType {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl fmt::Display for RecurrenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RecurrenceType::Daily => "Daily",
            RecurrenceType::Weekly => "Weekly",
            RecurrenceType::Monthly => "Monthly",
            RecurrenceType::Yearly => "Yearly",
        };
        f.write_str(s)
    }
}

// ── RecurrenceRule ──────────────────────────────────────────────────────────

/// A repeating date pattern.
///
/// Generated dates are cached on first use. Every `set_*` method clears the
/// cache; the `with_*` builders consume the rule and so never see a stale one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurrenceRule {
    recurrence_type: RecurrenceType,
    start_date: NaiveDate,
    finish_date: Option<NaiveDate>,
    occurrences: Option<u32>,
    frequency: u32,
    relative: bool,
    working_days_only: bool,
    /// Bit `n` set means the weekday `n` days after Monday is selected.
    weekdays: u8,
    day_number: Option<u32>,
    month_number: Option<u32>,
    #[serde(skip)]
    dates: OnceLock<Vec<NaiveDate>>,
}

impl PartialEq for RecurrenceRule {
    fn eq(&self, other: &Self) -> bool {
        self.recurrence_type == other.recurrence_type
            && self.start_date == other.start_date
            && self.finish_date == other.finish_date
            && self.occurrences == other.occurrences
            && self.frequency == other.frequency
            && self.relative == other.relative
            && self.working_days_only == other.working_days_only
            && self.weekdays == other.weekdays
            && self.day_number == other.day_number
            && self.month_number == other.month_number
    }
}

fn weekday_bit(day: Weekday) -> u8 {
    1 << day.num_days_from_monday()
}

impl RecurrenceRule {
    /// A rule producing a single occurrence on `start_date` until configured.
    pub fn new(recurrence_type: RecurrenceType, start_date: NaiveDate) -> Self {
        Self {
            recurrence_type,
            start_date,
            finish_date: None,
            occurrences: None,
            frequency: 1,
            relative: false,
            working_days_only: false,
            weekdays: 0,
            day_number: None,
            month_number: None,
            dates: OnceLock::new(),
        }
    }

    // ── builders ──

    /// Repeat every `frequency` periods. Zero is treated as one.
    pub fn with_frequency(mut self, frequency: u32) -> Self {
        self.set_frequency(frequency);
        self
    }

    /// Stop after `occurrences` dates. Ignored when a finish date is set.
    pub fn with_occurrences(mut self, occurrences: u32) -> Self {
        self.set_occurrences(Some(occurrences));
        self
    }

    /// Stop after `finish_date`, inclusive. Takes precedence over an
    /// occurrence count.
    pub fn with_finish_date(mut self, finish_date: NaiveDate) -> Self {
        self.set_finish_date(Some(finish_date));
        self
    }

    /// Select monthly and yearly dates by weekday position, such as
    /// "second Tuesday", rather than by day number.
    pub fn with_relative(mut self, relative: bool) -> Self {
        self.set_relative(relative);
        self
    }

    /// For daily rules, count only working days.
    pub fn with_working_days_only(mut self, working_days_only: bool) -> Self {
        self.set_working_days_only(working_days_only);
        self
    }

    pub fn with_weekday(mut self, day: Weekday) -> Self {
        self.set_weekday(day, true);
        self
    }

    /// Select several weekdays at once.
    pub fn with_weekdays(mut self, days: impl IntoIterator<Item = Weekday>) -> Self {
        for day in days {
            self.set_weekday(day, true);
        }
        self
    }

    pub fn with_day_number(mut self, day_number: u32) -> Self {
        self.set_day_number(Some(day_number));
        self
    }

    pub fn with_month_number(mut self, month_number: u32) -> Self {
        self.set_month_number(Some(month_number));
        self
    }

    // ── accessors ──

    pub fn recurrence_type(&self) -> RecurrenceType {
        self.recurrence_type
    }

    /// Date the rule starts from. Occurrences never precede it.
    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn finish_date(&self) -> Option<NaiveDate> {
        self.finish_date
    }

    pub fn occurrences(&self) -> Option<u32> {
        self.occurrences
    }

    pub fn frequency(&self) -> u32 {
        self.frequency
    }

    pub fn relative(&self) -> bool {
        self.relative
    }

    pub fn working_days_only(&self) -> bool {
        self.working_days_only
    }

    /// True when `day` is selected.
    pub fn weekday(&self, day: Weekday) -> bool {
        self.weekdays & weekday_bit(day) != 0
    }

    /// Selected weekdays, Monday first.
    pub fn weekdays(&self) -> impl Iterator<Item = Weekday> + '_ {
        WEEK.into_iter().filter(move |d| self.weekday(*d))
    }

    /// The weekday used by relative monthly and yearly patterns: the first
    /// selected day, Monday first.
    pub fn day_of_week(&self) -> Option<Weekday> {
        self.weekdays().next()
    }

    /// Day of the month, or the weekday position for relative rules.
    pub fn day_number(&self) -> Option<u32> {
        self.day_number
    }

    /// Month of the year for yearly rules, 1 to 12.
    pub fn month_number(&self) -> Option<u32> {
        self.month_number
    }

    // ── setters ──

    fn clear_dates(&mut self) {
        self.dates = OnceLock::new();
    }

    pub fn set_recurrence_type(&mut self, recurrence_type: RecurrenceType) {
        self.recurrence_type = recurrence_type;
        self.clear_dates();
    }

    pub fn set_start_date(&mut self, start_date: NaiveDate) {
        self.start_date = start_date;
        self.clear_dates();
    }

    pub fn set_finish_date(&mut self, finish_date: Option<NaiveDate>) {
        self.finish_date = finish_date;
        self.clear_dates();
    }

    pub fn set_occurrences(&mut self, occurrences: Option<u32>) {
        self.occurrences = occurrences;
        self.clear_dates();
    }

    pub fn set_frequency(&mut self, frequency: u32) {
        self.frequency = frequency;
        self.clear_dates();
    }

    pub fn set_relative(&mut self, relative: bool) {
        self.relative = relative;
        self.clear_dates();
    }

    pub fn set_working_days_only(&mut self, working_days_only: bool) {
        self.working_days_only = working_days_only;
        self.clear_dates();
    }

    /// Select or deselect `day`.
    pub fn set_weekday(&mut self, day: Weekday, selected: bool) {
        if selected {
            self.weekdays |= weekday_bit(day);
        } else {
            self.weekdays &= !weekday_bit(day);
        }
        self.clear_dates();
    }

    /// Replace the selection with a single weekday, for relative patterns.
    pub fn set_day_of_week(&mut self, day: Weekday) {
        self.weekdays = weekday_bit(day);
        self.clear_dates();
    }

    pub fn set_day_number(&mut self, day_number: Option<u32>) {
        self.day_number = day_number;
        self.clear_dates();
    }

    pub fn set_month_number(&mut self, month_number: Option<u32>) {
        self.month_number = month_number;
        self.clear_dates();
    }

    /// Configure a yearly absolute pattern on the day and month of `date`.
    pub fn set_yearly_absolute_from_date(&mut self, date: NaiveDate) {
        self.day_number = Some(date.day());
        self.month_number = Some(date.month());
        self.clear_dates();
    }

    // ── expansion ──

    /// Generated dates, in order.
    ///
    /// "Working days only" daily rules treat Monday to Friday as working here;
    /// use [`dates_with`](Self::dates_with) to supply a calendar's view.
    pub fn dates(&self) -> &[NaiveDate] {
        self.dates.get_or_init(|| {
            self.generate(&|d: NaiveDate| {
                DayType::weekday_fallback(d.weekday()) == DayType::Working
            })
        })
    }

    /// Generated dates using `is_working` to decide which days count for
    /// "working days only" daily rules. Other rules ignore the predicate and
    /// come from the cache.
    pub fn dates_with(&self, is_working: &dyn Fn(NaiveDate) -> bool) -> Vec<NaiveDate> {
        if self.uses_working_days() {
            self.generate(is_working)
        } else {
            self.dates().to_vec()
        }
    }

    pub(crate) fn uses_working_days(&self) -> bool {
        self.recurrence_type == RecurrenceType::Daily && self.working_days_only
    }

    /// First generated date, if any.
    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates().first().copied()
    }

    /// Last generated date, if any.
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates().last().copied()
    }

    /// True when the rule produces at least one date.
    pub fn is_valid(&self) -> bool {
        !self.dates().is_empty()
    }

    fn generate(&self, is_working: &dyn Fn(NaiveDate) -> bool) -> Vec<NaiveDate> {
        let mut out = Occurrences::new(self);
        match (self.recurrence_type, self.relative) {
            (RecurrenceType::Daily, _) if self.working_days_only => {
                self.daily_working(&mut out, is_working)
            }
            (RecurrenceType::Daily, _) => self.daily(&mut out),
            (RecurrenceType::Weekly, _) => self.weekly(&mut out),
            (RecurrenceType::Monthly, true) => self.monthly_relative(&mut out),
            (RecurrenceType::Monthly, false) => self.monthly_absolute(&mut out),
            (RecurrenceType::Yearly, true) => self.yearly_relative(&mut out),
            (RecurrenceType::Yearly, false) => self.yearly_absolute(&mut out),
        }
        out.dates
    }

    fn step(&self) -> u32 {
        self.frequency.max(1)
    }

    fn daily(&self, out: &mut Occurrences) {
        let step = TimeDelta::days(self.step() as i64);
        let mut date = self.start_date;
        while out.push(date) {
            let Some(next) = date.checked_add_signed(step) else {
                break;
            };
            date = next;
        }
    }

    fn daily_working(&self, out: &mut Occurrences, is_working: &dyn Fn(NaiveDate) -> bool) {
        let Some(mut date) = next_working(self.start_date, is_working) else {
            return;
        };
        while out.push(date) {
            for _ in 0..self.step() {
                match date.succ_opt().and_then(|d| next_working(d, is_working)) {
                    Some(next) => date = next,
                    None => return,
                }
            }
        }
    }

    fn weekly(&self, out: &mut Occurrences) {
        if self.weekdays == 0 {
            return;
        }
        let back = self.start_date.weekday().num_days_from_sunday() as i64;
        let mut week_start = self.start_date - TimeDelta::days(back);
        let step = TimeDelta::weeks(self.step() as i64);
        while out.has_more(week_start) {
            for offset in 0..7 {
                let date = week_start + TimeDelta::days(offset);
                if !self.weekday(date.weekday()) || date < self.start_date {
                    continue;
                }
                if !out.push(date) {
                    return;
                }
            }
            week_start = match week_start.checked_add_signed(step) {
                Some(next) => next,
                None => return,
            };
        }
    }

    fn monthly_relative(&self, out: &mut Occurrences) {
        let Some(day) = self.day_of_week() else {
            return;
        };
        let ordinal = self.day_number.unwrap_or(1);
        let mut month = first_of_month(self.start_date.year(), self.start_date.month());
        while let Some(first) = month {
            if !out.has_more(first) {
                break;
            }
            if let Some(date) = relative_day(first, day, ordinal) {
                if date >= self.start_date && !out.push(date) {
                    break;
                }
            }
            month = first.checked_add_months(Months::new(self.step()));
        }
    }

    fn monthly_absolute(&self, out: &mut Occurrences) {
        let wanted = self.day_number.unwrap_or(self.start_date.day());
        let mut month = first_of_month(self.start_date.year(), self.start_date.month());
        if wanted < self.start_date.day() {
            month = month.and_then(|m| m.checked_add_months(Months::new(1)));
        }
        while let Some(first) = month {
            let Some(date) = clamped_day(first, wanted) else {
                break;
            };
            if !out.push(date) {
                break;
            }
            month = first.checked_add_months(Months::new(self.step()));
        }
    }

    fn month(&self) -> u32 {
        self.month_number
            .filter(|m| (1..=12).contains(m))
            .unwrap_or(self.start_date.month())
    }

    fn yearly_relative(&self, out: &mut Occurrences) {
        let Some(day) = self.day_of_week() else {
            return;
        };
        let ordinal = self.day_number.unwrap_or(1);
        let mut year = self.start_date.year();
        while let Some(first) = first_of_month(year, self.month()) {
            if !out.has_more(first) {
                break;
            }
            if let Some(date) = relative_day(first, day, ordinal) {
                if date >= self.start_date && !out.push(date) {
                    break;
                }
            }
            year += 1;
        }
    }

    fn yearly_absolute(&self, out: &mut Occurrences) {
        let wanted = self.day_number.unwrap_or(self.start_date.day());
        let mut year = self.start_date.year();
        loop {
            let Some(mut date) =
                first_of_month(year, self.month()).and_then(|m| clamped_day(m, wanted))
            else {
                break;
            };
            if date < self.start_date {
                year += 1;
                match first_of_month(year, self.month()).and_then(|m| clamped_day(m, wanted)) {
                    Some(next) => date = next,
                    None => break,
                }
            }
            if !out.push(date) {
                break;
            }
            year += 1;
        }
    }
}

// ── helpers ─────────────────────────────────────────────────────────────────

/// Accumulates generated dates until the rule's termination is reached.
struct Occurrences {
    finish: Option<NaiveDate>,
    limit: usize,
    dates: Vec<NaiveDate>,
}

impl Occurrences {
    fn new(rule: &RecurrenceRule) -> Self {
        Self {
            finish: rule.finish_date,
            limit: rule.occurrences.unwrap_or(1).max(1) as usize,
            dates: Vec::new(),
        }
    }

    fn has_more(&self, candidate: NaiveDate) -> bool {
        match self.finish {
            Some(finish) => candidate <= finish,
            None => self.dates.len() < self.limit,
        }
    }

    /// Record `date` if the rule allows another occurrence on it. Returns
    /// false once generation should stop.
    fn push(&mut self, date: NaiveDate) -> bool {
        if !self.has_more(date) {
            return false;
        }
        self.dates.push(date);
        true
    }
}

fn first_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
}

fn last_of_month(first: NaiveDate) -> Option<NaiveDate> {
    first.checked_add_months(Months::new(1))?.pred_opt()
}

/// `day` of the month starting at `first`, clamped to the month's last day.
fn clamped_day(first: NaiveDate, day: u32) -> Option<NaiveDate> {
    let last = last_of_month(first)?;
    first.with_day(day.clamp(1, last.day()))
}

/// The `ordinal`-th `day` of the month starting at `first`, or the last one
/// when `ordinal` is 5 or more.
fn relative_day(first: NaiveDate, day: Weekday, ordinal: u32) -> Option<NaiveDate> {
    if ordinal > 4 {
        let last = last_of_month(first)?;
        let back = (last.weekday().num_days_from_monday() + 7 - day.num_days_from_monday()) % 7;
        return last.checked_sub_signed(TimeDelta::days(back as i64));
    }
    let forward = (day.num_days_from_monday() + 7 - first.weekday().num_days_from_monday()) % 7;
    let weeks = ordinal.max(1) - 1;
    first.checked_add_signed(TimeDelta::days((forward + 7 * weeks) as i64))
}

/// First working date on or after `date`, giving up after a long run of
/// non-working days.
fn next_working(mut date: NaiveDate, is_working: &dyn Fn(NaiveDate) -> bool) -> Option<NaiveDate> {
    for _ in 0..MAX_NONWORKING_DAYS {
        if is_working(date) {
            return Some(date);
        }
        date = date.succ_opt()?;
    }
    None
}

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

fn month_name(month: u32) -> &'static str {
    u8::try_from(month)
        .ok()
        .and_then(|m| chrono::Month::try_from(m).ok())
        .map(|m| m.name())
        .unwrap_or("?")
}

fn frequency_phrase(frequency: u32) -> String {
    match frequency {
        0 | 1 => "every".to_string(),
        2 => "every other".to_string(),
        n => {
            let suffix = match (n % 10, n % 100) {
                (1, 11) | (2, 12) | (3, 13) => "th",
                (1, _) => "st",
                (2, _) => "nd",
                (3, _) => "rd",
                _ => "th",
            };
            format!("every {n}{suffix}")
        }
    }
}

fn ordinal_name(day_number: u32) -> &'static str {
    match day_number {
        0 | 1 => "first",
        2 => "second",
        3 => "third",
        4 => "fourth",
        _ => "last",
    }
}

impl fmt::Display for RecurrenceRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let every = frequency_phrase(self.frequency);
        let weekday = self.day_of_week().map(weekday_name).unwrap_or("?");
        let day_number = self.day_number.unwrap_or(self.start_date.day());
        write!(f, "{}", self.recurrence_type)?;
        match (self.recurrence_type, self.relative) {
            (RecurrenceType::Daily, _) => {
                let unit = if self.working_days_only {
                    "working day"
                } else {
                    "day"
                };
                write!(f, " {every} {unit}")?;
            }
            (RecurrenceType::Weekly, _) => {
                let days: Vec<_> = self.weekdays().map(weekday_name).collect();
                write!(f, " {every} week on {}", days.join(", "))?;
            }
            (RecurrenceType::Monthly, true) => {
                let ordinal = ordinal_name(self.day_number.unwrap_or(1));
                write!(f, " on the {ordinal} {weekday} of {every} month")?;
            }
            (RecurrenceType::Monthly, false) => {
                write!(f, " on day {day_number} of {every} month")?;
            }
            (RecurrenceType::Yearly, true) => {
                let ordinal = ordinal_name(self.day_number.unwrap_or(1));
                write!(f, " on the {ordinal} {weekday} of {}", month_name(self.month()))?;
            }
            (RecurrenceType::Yearly, false) => {
                write!(f, " on {day_number} {}", month_name(self.month()))?;
            }
        }
        write!(f, " From {}", self.start_date)?;
        if let Some(occurrences) = self.occurrences {
            write!(f, " For {occurrences} occurrences")?;
        }
        if let Some(finish) = self.finish_date {
            write!(f, " To {finish}")?;
        }
        Ok(())
    }
}
