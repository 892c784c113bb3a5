//! Calendars, the container that owns them, and the handles used to query
//! and edit them.
//!
//! Calendars refer to their parent by [`CalendarId`]; the [`ProjectCalendars`]
//! container owns every calendar. Reads go through a [`CalendarRef`], which
//! resolves inherited values up the parent chain. Edits go through a
//! [`CalendarMut`], which holds the container mutably and clears the working
//! time caches of the edited calendar and all calendars derived from it when
//! it is dropped, so no stale value can be observed.
//!
//! # Resolution order for a date
//!
//! 1. An exception covering the date, in this calendar or an ancestor.
//! 2. A work week overlay covering the date, in this calendar or an ancestor.
//! 3. The calendar's weekly definition for that day of the week.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::cache::WorkingTimeCache;
use crate::days::{CalendarDays, DayType, DEFAULT_WORKING_HOURS, WEEK};
use crate::duration::TimeUnitDefaults;
use crate::error::{CalendarError, Result};
use crate::exception::{expand_exceptions, find_exception, CalendarException};
use crate::properties::ProjectProperties;
use crate::range::{intersect_ranges, time_from_ms, LocalDateRange, TimeRange};
use crate::recurrence::RecurrenceRule;
use crate::week::WorkWeek;

/// Name given to the calendar created by
/// [`ProjectCalendars::add_default_base_calendar`].
pub const DEFAULT_BASE_CALENDAR_NAME: &str = "Standard";

/// Identifier of a calendar within its container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CalendarId(pub u32);

impl fmt::Display for CalendarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "calendar #{}", self.0)
    }
}

/// What a calendar is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalendarKind {
    #[default]
    Global,
    Resource,
    Project,
}

// ── Calendar ────────────────────────────────────────────────────────────────

/// A calendar definition as stored in the container.
///
/// Values held here are the calendar's own; use [`CalendarRef`] for values
/// resolved through the parent chain.
#[derive(Debug)]
pub struct Calendar {
    id: CalendarId,
    name: String,
    parent: Option<CalendarId>,
    days: CalendarDays,
    exceptions: Vec<CalendarException>,
    work_weeks: Vec<WorkWeek>,
    minutes_per_day: Option<u32>,
    minutes_per_week: Option<u32>,
    minutes_per_month: Option<u32>,
    minutes_per_year: Option<u32>,
    kind: CalendarKind,
    personal: bool,
    pub(crate) cache: WorkingTimeCache,
}

impl Calendar {
    fn new(id: CalendarId, name: String) -> Self {
        Self {
            id,
            name,
            parent: None,
            days: CalendarDays::new(),
            exceptions: Vec::new(),
            work_weeks: Vec::new(),
            minutes_per_day: None,
            minutes_per_week: None,
            minutes_per_month: None,
            minutes_per_year: None,
            kind: CalendarKind::default(),
            personal: false,
            cache: WorkingTimeCache::default(),
        }
    }

    /// A copy of this definition under `id`, with empty caches.
    fn duplicate(&self, id: CalendarId) -> Self {
        Self {
            id,
            name: self.name.clone(),
            parent: self.parent,
            days: self.days.clone(),
            exceptions: self.exceptions.clone(),
            work_weeks: self.work_weeks.clone(),
            minutes_per_day: self.minutes_per_day,
            minutes_per_week: self.minutes_per_week,
            minutes_per_month: self.minutes_per_month,
            minutes_per_year: self.minutes_per_year,
            kind: self.kind,
            personal: self.personal,
            cache: WorkingTimeCache::default(),
        }
    }

    /// Id within the owning container.
    pub fn id(&self) -> CalendarId {
        self.id
    }

    /// Display name. May be empty for derived calendars.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The calendar this one derives from, if any.
    pub fn parent_id(&self) -> Option<CalendarId> {
        self.parent
    }

    /// Weekly definition as set on this calendar.
    pub fn days(&self) -> &CalendarDays {
        &self.days
    }

    /// Exceptions as defined, recurring ones unexpanded.
    pub fn exceptions(&self) -> &[CalendarException] {
        &self.exceptions
    }

    /// Work week overlays in definition order.
    pub fn work_weeks(&self) -> &[WorkWeek] {
        &self.work_weeks
    }

    pub fn kind(&self) -> CalendarKind {
        self.kind
    }

    /// True for a calendar belonging to a single resource.
    pub fn is_personal(&self) -> bool {
        self.personal
    }

    /// Minutes per day set on this calendar, without inheritance.
    pub fn calendar_minutes_per_day(&self) -> Option<u32> {
        self.minutes_per_day
    }

    /// Minutes per week set on this calendar, without inheritance.
    pub fn calendar_minutes_per_week(&self) -> Option<u32> {
        self.minutes_per_week
    }

    /// Minutes per month set on this calendar, without inheritance.
    pub fn calendar_minutes_per_month(&self) -> Option<u32> {
        self.minutes_per_month
    }

    /// Minutes per year set on this calendar, without inheritance.
    pub fn calendar_minutes_per_year(&self) -> Option<u32> {
        self.minutes_per_year
    }
}

// ── ProjectCalendars ────────────────────────────────────────────────────────

/// Owner of every calendar in a project, plus the project-wide defaults.
#[derive(Debug, Default)]
pub struct ProjectCalendars {
    calendars: BTreeMap<CalendarId, Calendar>,
    next_id: u32,
    properties: ProjectProperties,
}

impl ProjectCalendars {
    /// An empty container with default project properties.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty container using `properties` as the project defaults.
    pub fn with_properties(properties: ProjectProperties) -> Self {
        Self {
            properties,
            ..Self::default()
        }
    }

    /// Project defaults for unit conversion and backward projection.
    pub fn properties(&self) -> &ProjectProperties {
        &self.properties
    }

    /// Replace the project defaults. Every calendar's caches are cleared.
    pub fn set_properties(&mut self, properties: ProjectProperties) {
        self.properties = properties;
        for calendar in self.calendars.values_mut() {
            calendar.cache.clear();
        }
    }

    /// Number of calendars held.
    pub fn len(&self) -> usize {
        self.calendars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calendars.is_empty()
    }

    /// Add an empty calendar: every day `Default`, no hours, no parent. It
    /// works the standard shifts Monday to Friday until edited.
    pub fn add_calendar(&mut self, name: impl Into<String>) -> CalendarId {
        let id = CalendarId(self.next_id);
        self.next_id += 1;
        self.calendars.insert(id, Calendar::new(id, name.into()));
        id
    }

    /// Add a "Standard" calendar: Monday to Friday 08:00-12:00 and
    /// 13:00-17:00, weekend non-working.
    pub fn add_default_base_calendar(&mut self) -> CalendarId {
        let id = self.add_calendar(DEFAULT_BASE_CALENDAR_NAME);
        if let Some(calendar) = self.calendars.get_mut(&id) {
            calendar.days = CalendarDays::standard();
        }
        id
    }

    /// Add an unnamed calendar deriving every day from `parent`.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::UnknownCalendar`] if `parent` does not exist.
    pub fn add_default_derived_calendar(&mut self, parent: CalendarId) -> Result<CalendarId> {
        if !self.calendars.contains_key(&parent) {
            return Err(CalendarError::UnknownCalendar(parent));
        }
        let id = self.add_calendar("");
        if let Some(calendar) = self.calendars.get_mut(&id) {
            calendar.parent = Some(parent);
        }
        Ok(id)
    }

    /// Add a copy of `source` under a new id.
    ///
    /// The copy keeps the name, parent, weekly definition, exceptions, work
    /// weeks, unit overrides and flags of `source`, and is edited
    /// independently of it.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::UnknownCalendar`] if `source` does not exist.
    pub fn copy_calendar(&mut self, source: CalendarId) -> Result<CalendarId> {
        let id = CalendarId(self.next_id);
        let copy = self
            .calendars
            .get(&source)
            .ok_or(CalendarError::UnknownCalendar(source))?
            .duplicate(id);
        self.next_id += 1;
        self.calendars.insert(id, copy);
        debug!(calendar = %id, %source, "copied calendar");
        Ok(id)
    }

    /// Add a calendar that works only when both `task` and `resource` do.
    ///
    /// Each day of the week works the hours the two calendars have in common,
    /// and is non-working when they share none. The exceptions defined on
    /// both are copied, the task's first. The result is a root resource
    /// calendar named after both; work weeks are not carried over.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::UnknownCalendar`] if either calendar does not
    /// exist.
    pub fn add_combined_calendar(&mut self, task: CalendarId, resource: CalendarId) -> Result<CalendarId> {
        let task_calendar = self.calendar(task).ok_or(CalendarError::UnknownCalendar(task))?;
        let resource_calendar = self
            .calendar(resource)
            .ok_or(CalendarError::UnknownCalendar(resource))?;

        let mut days = CalendarDays::new();
        for day in WEEK {
            let common = if task_calendar.is_working_day(day) && resource_calendar.is_working_day(day) {
                intersect_ranges(task_calendar.hours(day), resource_calendar.hours(day))
            } else {
                Vec::new()
            };
            days.set_working_day(day, !common.is_empty());
            days.set_calendar_hours(day, common);
        }
        let exceptions: Vec<_> = task_calendar
            .calendar()
            .exceptions
            .iter()
            .chain(&resource_calendar.calendar().exceptions)
            .cloned()
            .collect();
        let name = format!("{} / {}", task_calendar.name(), resource_calendar.name());
        let personal = resource_calendar.calendar().personal;

        let id = self.add_calendar(name);
        if let Some(calendar) = self.calendars.get_mut(&id) {
            calendar.days = days;
            calendar.exceptions = exceptions;
            calendar.kind = CalendarKind::Resource;
            calendar.personal = personal;
        }
        debug!(calendar = %id, %task, %resource, "added combined calendar");
        Ok(id)
    }

    /// Read access to a calendar, or `None` if `id` is unknown.
    pub fn calendar(&self, id: CalendarId) -> Option<CalendarRef<'_>> {
        self.calendars.get(&id).map(|calendar| CalendarRef {
            container: self,
            calendar,
        })
    }

    /// First calendar with the given name, in id order.
    pub fn calendar_by_name(&self, name: &str) -> Option<CalendarRef<'_>> {
        self.iter().find(|c| c.name() == name)
    }

    /// Edit a calendar. Caches are cleared when the handle is dropped.
    pub fn calendar_mut(&mut self, id: CalendarId) -> Option<CalendarMut<'_>> {
        let calendar = self.calendars.remove(&id)?;
        Some(CalendarMut {
            container: self,
            id,
            calendar: Some(calendar),
        })
    }

    /// Every calendar, in id order.
    pub fn iter(&self) -> impl Iterator<Item = CalendarRef<'_>> + '_ {
        self.calendars.values().map(move |calendar| CalendarRef {
            container: self,
            calendar,
        })
    }

    /// Remove a calendar. Calendars derived from it lose their parent.
    pub fn remove_calendar(&mut self, id: CalendarId) -> Option<Calendar> {
        let removed = self.calendars.remove(&id)?;
        for child in self.derived_calendars(id) {
            if let Some(calendar) = self.calendars.get_mut(&child) {
                calendar.parent = None;
            }
            self.invalidate(child);
        }
        Some(removed)
    }

    /// Set or clear a calendar's parent.
    ///
    /// Making a calendar its own parent is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::UnknownCalendar`] if either calendar is
    /// missing, or [`CalendarError::ParentCycle`] if `parent` already derives
    /// from `child`.
    pub fn set_parent(&mut self, child: CalendarId, parent: Option<CalendarId>) -> Result<()> {
        self.calendar_mut(child)
            .ok_or(CalendarError::UnknownCalendar(child))?
            .set_parent(parent)
    }

    /// Calendars whose parent is `id`.
    pub fn derived_calendars(&self, id: CalendarId) -> Vec<CalendarId> {
        self.calendars
            .values()
            .filter(|c| c.parent == Some(id))
            .map(|c| c.id)
            .collect()
    }

    /// Clear the caches of `id` and every calendar derived from it, directly
    /// or transitively.
    fn invalidate(&mut self, id: CalendarId) {
        let mut pending = vec![id];
        let mut seen = BTreeSet::new();
        while let Some(current) = pending.pop() {
            if !seen.insert(current) {
                continue;
            }
            if let Some(calendar) = self.calendars.get_mut(&current) {
                calendar.cache.clear();
            }
            pending.extend(self.derived_calendars(current));
        }
        debug!(calendar = %id, cleared = seen.len(), "invalidated working time caches");
    }
}

// ── CalendarRef ─────────────────────────────────────────────────────────────

/// Read access to one calendar, resolving inherited values through its
/// parents.
#[derive(Clone, Copy)]
pub struct CalendarRef<'a> {
    pub(crate) container: &'a ProjectCalendars,
    pub(crate) calendar: &'a Calendar,
}

impl fmt::Debug for CalendarRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CalendarRef")
            .field("id", &self.calendar.id)
            .field("name", &self.calendar.name)
            .field("parent", &self.calendar.parent)
            .finish()
    }
}

impl<'a> CalendarRef<'a> {
    /// The underlying definition.
    pub fn calendar(&self) -> &'a Calendar {
        self.calendar
    }

    pub fn id(&self) -> CalendarId {
        self.calendar.id
    }

    pub fn name(&self) -> &'a str {
        &self.calendar.name
    }

    /// Project defaults of the owning container.
    pub fn properties(&self) -> &'a ProjectProperties {
        &self.container.properties
    }

    /// The parent calendar. `None` for a root calendar or a dangling id.
    pub fn parent(&self) -> Option<CalendarRef<'a>> {
        self.calendar
            .parent
            .and_then(|id| self.container.calendar(id))
    }

    /// Calendars whose parent is this calendar.
    pub fn derived_calendars(&self) -> Vec<CalendarId> {
        self.container.derived_calendars(self.calendar.id)
    }

    // ── day of week ──

    /// The day type set on this calendar, which may be `Default`.
    pub fn calendar_day_type(&self, day: Weekday) -> DayType {
        self.calendar.days.day_type(day)
    }

    /// Hours set on this calendar, without inheritance.
    pub fn calendar_hours(&self, day: Weekday) -> Option<&'a [TimeRange]> {
        self.calendar.days.hours(day)
    }

    /// Day type with `Default` resolved through the parents. A root calendar
    /// treats a `Default` Saturday or Sunday as non-working and any other
    /// `Default` day as working.
    pub fn day_type(&self, day: Weekday) -> DayType {
        match self.calendar_day_type(day) {
            DayType::Default => match self.parent() {
                Some(parent) => parent.day_type(day),
                None => DayType::weekday_fallback(day),
            },
            resolved => resolved,
        }
    }

    /// True when `day` resolves to `Working`.
    pub fn is_working_day(&self, day: Weekday) -> bool {
        self.day_type(day) == DayType::Working
    }

    /// Working hours for a day of the week.
    ///
    /// Non-working days have none. Working days use this calendar's hours,
    /// then the parent's, then the standard shifts. `Default` days use the
    /// parent's; a root calendar works the standard shifts on a `Default`
    /// weekday and nothing on a `Default` weekend day. The result is empty
    /// exactly when [`day_type`](Self::day_type) is `NonWorking`.
    pub fn hours(&self, day: Weekday) -> &'a [TimeRange] {
        match self.calendar_day_type(day) {
            DayType::NonWorking => &[],
            DayType::Working => match self.calendar_hours(day) {
                Some(hours) if !hours.is_empty() => hours,
                _ => self.inherited_working_hours(day),
            },
            DayType::Default => match self.parent() {
                Some(parent) => parent.hours(day),
                None if DayType::weekday_fallback(day) == DayType::Working => {
                    DEFAULT_WORKING_HOURS.as_slice()
                }
                None => &[],
            },
        }
    }

    /// Hours for a working day with none of its own.
    fn inherited_working_hours(&self, day: Weekday) -> &'a [TimeRange] {
        match self.parent().map(|p| p.hours(day)) {
            Some(hours) if !hours.is_empty() => hours,
            _ => DEFAULT_WORKING_HOURS.as_slice(),
        }
    }

    // ── by date ──

    /// Exceptions with recurring entries expanded, sorted by date.
    pub fn expanded_exceptions(&self) -> &'a [CalendarException] {
        let calendar = self.calendar;
        let this = *self;
        calendar.cache.expanded.get_or_init(|| {
            expand_exceptions(&calendar.exceptions, &|date| {
                !this.regular_hours(date).is_empty()
            })
        })
    }

    /// The exception covering `date`, in this calendar or an ancestor.
    pub fn exception(&self, date: NaiveDate) -> Option<&'a CalendarException> {
        find_exception(self.expanded_exceptions(), date)
            .or_else(|| self.parent().and_then(|p| p.exception(date)))
    }

    /// The work week overlay covering `date`, in this calendar or an ancestor.
    pub fn work_week(&self, date: NaiveDate) -> Option<&'a WorkWeek> {
        let calendar = self.calendar;
        let weeks = calendar.cache.weeks.get_or_init(|| {
            let mut sorted: Vec<_> = calendar
                .work_weeks
                .iter()
                .enumerate()
                .filter_map(|(index, week)| week.date_range().map(|range| (range, index)))
                .collect();
            sorted.sort();
            sorted
        });
        weeks
            .binary_search_by(|(range, _)| range.compare_point(date))
            .ok()
            .map(|found| &calendar.work_weeks[weeks[found].1])
            .or_else(|| self.parent().and_then(|p| p.work_week(date)))
    }

    /// Working hours on `date`.
    pub fn hours_for_date(&self, date: NaiveDate) -> &'a [TimeRange] {
        match self.exception(date) {
            Some(exception) => exception.hours(),
            None => self.regular_hours(date),
        }
    }

    /// Hours on `date` ignoring exceptions. A `Default` day in a work week
    /// overlay follows the calendar's regular week.
    fn regular_hours(&self, date: NaiveDate) -> &'a [TimeRange] {
        let day = date.weekday();
        let Some(week) = self.work_week(date) else {
            return self.hours(day);
        };
        let days = week.days();
        match days.day_type(day) {
            DayType::NonWorking => &[],
            DayType::Working => match days.hours(day) {
                Some(hours) if !hours.is_empty() => hours,
                _ => match self.hours(day) {
                    [] => DEFAULT_WORKING_HOURS.as_slice(),
                    hours => hours,
                },
            },
            DayType::Default => self.hours(day),
        }
    }

    /// True when `date` has any working hours.
    pub fn is_working_date(&self, date: NaiveDate) -> bool {
        !self.hours_for_date(date).is_empty()
    }

    /// Start of the first working period on `date`.
    pub fn start_time(&self, date: NaiveDate) -> Option<NaiveTime> {
        let cache = &self.calendar.cache.start_times;
        if let Some(hit) = cache.get(&date) {
            trace!(calendar = %self.calendar.id, %date, "start time cache hit");
            return hit;
        }
        let start = self
            .hours_for_date(date)
            .iter()
            .find_map(TimeRange::day_bounds)
            .map(|(start, _)| time_from_ms(start));
        cache.insert(date, start);
        start
    }

    /// End of the last working period on `date`. Midnight means the day is
    /// worked to its end.
    pub fn finish_time(&self, date: NaiveDate) -> Option<NaiveTime> {
        self.hours_for_date(date)
            .iter()
            .rev()
            .find_map(TimeRange::day_bounds)
            .map(|(_, end)| time_from_ms(end))
    }
}

impl TimeUnitDefaults for CalendarRef<'_> {
    fn minutes_per_day(&self) -> u32 {
        self.calendar
            .minutes_per_day
            .or_else(|| self.parent().map(|p| p.minutes_per_day()))
            .unwrap_or(self.container.properties.minutes_per_day)
    }

    fn minutes_per_week(&self) -> u32 {
        self.calendar
            .minutes_per_week
            .or_else(|| self.parent().map(|p| p.minutes_per_week()))
            .unwrap_or(self.container.properties.minutes_per_week)
    }

    fn minutes_per_month(&self) -> u32 {
        self.calendar
            .minutes_per_month
            .or_else(|| self.parent().map(|p| p.minutes_per_month()))
            .unwrap_or(self.container.properties.minutes_per_month)
    }

    fn minutes_per_year(&self) -> u32 {
        self.calendar
            .minutes_per_year
            .or_else(|| self.parent().map(|p| p.minutes_per_year()))
            .unwrap_or(self.container.properties.minutes_per_year)
    }

    fn days_per_month(&self) -> u32 {
        self.container.properties.days_per_month
    }
}

// ── CalendarMut ─────────────────────────────────────────────────────────────

/// Edit access to one calendar.
///
/// The calendar is detached from the container while the handle lives and
/// put back, with caches cleared for it and everything derived from it, when
/// the handle is dropped.
pub struct CalendarMut<'a> {
    container: &'a mut ProjectCalendars,
    id: CalendarId,
    /// Taken back by the container on drop; `Some` until then.
    calendar: Option<Calendar>,
}

impl Drop for CalendarMut<'_> {
    fn drop(&mut self) {
        if let Some(calendar) = self.calendar.take() {
            self.container.calendars.insert(self.id, calendar);
        }
        self.container.invalidate(self.id);
    }
}

impl fmt::Debug for CalendarMut<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CalendarMut")
            .field("id", &self.id)
            .field("calendar", &self.calendar)
            .finish()
    }
}

impl CalendarMut<'_> {
    /// The definition being edited.
    pub fn calendar(&self) -> Option<&Calendar> {
        self.calendar.as_ref()
    }

    /// Id of the calendar being edited.
    pub fn id(&self) -> CalendarId {
        self.id
    }

    fn definition(&mut self) -> &mut Calendar {
        let id = self.id;
        self.calendar.get_or_insert_with(|| Calendar::new(id, String::new()))
    }

    /// Rename the calendar. Names need not be unique.
    pub fn set_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.definition().name = name.into();
        self
    }

    /// Set what the calendar is used for.
    pub fn set_kind(&mut self, kind: CalendarKind) -> &mut Self {
        self.definition().kind = kind;
        self
    }

    /// Mark the calendar as belonging to a single resource.
    pub fn set_personal(&mut self, personal: bool) -> &mut Self {
        self.definition().personal = personal;
        self
    }

    // ── weekly definition ──

    /// Set a day of the week to working, non-working or inherited.
    pub fn set_day_type(&mut self, day: Weekday, day_type: DayType) -> &mut Self {
        self.definition().days.set_day_type(day, day_type);
        self
    }

    /// Shorthand for [`set_day_type`](Self::set_day_type) with `Working` or
    /// `NonWorking`.
    pub fn set_working_day(&mut self, day: Weekday, working: bool) -> &mut Self {
        self.definition().days.set_working_day(day, working);
        self
    }

    /// Add a range to the hours of `day`, keeping them sorted by start.
    pub fn add_calendar_hours(&mut self, day: Weekday, range: TimeRange) -> &mut Self {
        self.definition().days.add_calendar_hours(day, range);
        self
    }

    /// Replace the hours of `day`.
    pub fn set_calendar_hours(&mut self, day: Weekday, ranges: Vec<TimeRange>) -> &mut Self {
        self.definition().days.set_calendar_hours(day, ranges);
        self
    }

    /// Forget the hours set for `day`, returning them.
    pub fn remove_calendar_hours(&mut self, day: Weekday) -> Option<Vec<TimeRange>> {
        self.definition().days.remove_calendar_hours(day)
    }

    /// Standard hours on weekdays, none on the weekend.
    pub fn add_default_calendar_hours(&mut self) -> &mut Self {
        self.definition().days.add_default_calendar_hours();
        self
    }

    /// Direct access to the weekly definition.
    pub fn days_mut(&mut self) -> &mut CalendarDays {
        &mut self.definition().days
    }

    // ── exceptions ──

    /// Add a non-working exception from `from` to `to` inclusive. Add ranges
    /// to the returned exception to make it a working one.
    pub fn add_calendar_exception(&mut self, from: NaiveDate, to: NaiveDate) -> &mut CalendarException {
        self.push_exception(CalendarException::new(from, to))
    }

    /// Add a non-working exception on every date generated by `rule`.
    pub fn add_recurring_exception(&mut self, rule: RecurrenceRule) -> &mut CalendarException {
        self.push_exception(CalendarException::recurring(rule))
    }

    fn push_exception(&mut self, exception: CalendarException) -> &mut CalendarException {
        let exceptions = &mut self.definition().exceptions;
        let index = exceptions.len();
        exceptions.push(exception);
        &mut exceptions[index]
    }

    /// Exception at `index` in definition order.
    pub fn exception_mut(&mut self, index: usize) -> Option<&mut CalendarException> {
        self.definition().exceptions.get_mut(index)
    }

    /// Remove the exception at `index`, returning it.
    pub fn remove_calendar_exception(&mut self, index: usize) -> Option<CalendarException> {
        let exceptions = &mut self.definition().exceptions;
        (index < exceptions.len()).then(|| exceptions.remove(index))
    }

    /// Remove every exception.
    pub fn clear_calendar_exceptions(&mut self) -> &mut Self {
        self.definition().exceptions.clear();
        self
    }

    // ── work weeks ──

    /// Add a work week overlay valid over `range`.
    pub fn add_work_week(&mut self, range: LocalDateRange) -> &mut WorkWeek {
        let weeks = &mut self.definition().work_weeks;
        let index = weeks.len();
        weeks.push(WorkWeek::new(Some(range)));
        &mut weeks[index]
    }

    /// Work week at `index` in definition order.
    pub fn work_week_mut(&mut self, index: usize) -> Option<&mut WorkWeek> {
        self.definition().work_weeks.get_mut(index)
    }

    /// Remove the work week at `index`, returning it.
    pub fn remove_work_week(&mut self, index: usize) -> Option<WorkWeek> {
        let weeks = &mut self.definition().work_weeks;
        (index < weeks.len()).then(|| weeks.remove(index))
    }

    /// Remove every work week overlay.
    pub fn clear_work_weeks(&mut self) -> &mut Self {
        self.definition().work_weeks.clear();
        self
    }

    // ── units ──

    /// Override minutes per day for this calendar; `None` inherits.
    pub fn set_minutes_per_day(&mut self, minutes: Option<u32>) -> &mut Self {
        self.definition().minutes_per_day = minutes;
        self
    }

    /// Override minutes per week; `None` inherits.
    pub fn set_minutes_per_week(&mut self, minutes: Option<u32>) -> &mut Self {
        self.definition().minutes_per_week = minutes;
        self
    }

    /// Override minutes per month; `None` inherits.
    pub fn set_minutes_per_month(&mut self, minutes: Option<u32>) -> &mut Self {
        self.definition().minutes_per_month = minutes;
        self
    }

    /// Override minutes per year; `None` inherits.
    pub fn set_minutes_per_year(&mut self, minutes: Option<u32>) -> &mut Self {
        self.definition().minutes_per_year = minutes;
        self
    }

    // ── derivation ──

    /// Set or clear the parent. Making a calendar its own parent is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::UnknownCalendar`] if `parent` does not exist,
    /// or [`CalendarError::ParentCycle`] if it already derives from this
    /// calendar.
    pub fn set_parent(&mut self, parent: Option<CalendarId>) -> Result<()> {
        let id = self.id;
        let Some(parent) = parent else {
            self.definition().parent = None;
            return Ok(());
        };
        if parent == id {
            debug!(calendar = %id, "ignoring attempt to make a calendar its own parent");
            return Ok(());
        }
        if !self.container.calendars.contains_key(&parent) {
            return Err(CalendarError::UnknownCalendar(parent));
        }
        let mut ancestor = Some(parent);
        while let Some(current) = ancestor {
            if current == id {
                return Err(CalendarError::ParentCycle {
                    calendar: id,
                    parent,
                });
            }
            ancestor = self.container.calendars.get(&current).and_then(|c| c.parent);
        }
        self.definition().parent = Some(parent);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::days::{default_working_afternoon, default_working_morning};
    use crate::range::hm;
    use crate::recurrence::RecurrenceType;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn standard() -> (ProjectCalendars, CalendarId) {
        let mut calendars = ProjectCalendars::new();
        let id = calendars.add_default_base_calendar();
        (calendars, id)
    }

    // ── container ───────────────────────────────────────────────────────

    #[test]
    fn test_default_base_calendar() {
        let (calendars, id) = standard();
        let cal = calendars.calendar(id).unwrap();
        assert_eq!(cal.name(), "Standard");
        assert!(cal.is_working_day(Weekday::Mon));
        assert!(!cal.is_working_day(Weekday::Sat));
        assert_eq!(cal.hours(Weekday::Fri), &[default_working_morning(), default_working_afternoon()]);
        assert!(cal.hours(Weekday::Sun).is_empty());
    }

    #[test]
    fn test_lookup_by_name_and_iteration() {
        let (mut calendars, id) = standard();
        let night = calendars.add_calendar("Night shift");
        assert_eq!(calendars.calendar_by_name("Night shift").unwrap().id(), night);
        assert_eq!(calendars.calendar_by_name("Standard").unwrap().id(), id);
        assert!(calendars.calendar_by_name("missing").is_none());
        assert_eq!(calendars.iter().count(), 2);
        assert_eq!(calendars.len(), 2);
    }

    #[test]
    fn test_derived_calendar_inherits_everything() {
        let (mut calendars, base) = standard();
        let derived = calendars.add_default_derived_calendar(base).unwrap();
        let cal = calendars.calendar(derived).unwrap();
        assert_eq!(cal.parent().unwrap().id(), base);
        assert_eq!(cal.calendar_day_type(Weekday::Tue), DayType::Default);
        assert_eq!(cal.day_type(Weekday::Tue), DayType::Working);
        assert_eq!(cal.day_type(Weekday::Sun), DayType::NonWorking);
        assert_eq!(cal.hours(Weekday::Tue).len(), 2);
        assert_eq!(calendars.derived_calendars(base), vec![derived]);
    }

    #[test]
    fn test_derived_from_unknown_parent_fails() {
        let mut calendars = ProjectCalendars::new();
        assert_eq!(
            calendars.add_default_derived_calendar(CalendarId(9)),
            Err(CalendarError::UnknownCalendar(CalendarId(9)))
        );
    }

    #[test]
    fn test_default_day_without_parent_uses_weekday_rule() {
        let mut calendars = ProjectCalendars::new();
        let id = calendars.add_calendar("bare");
        let cal = calendars.calendar(id).unwrap();
        let shifts = [default_working_morning(), default_working_afternoon()];
        assert_eq!(cal.day_type(Weekday::Wed), DayType::Working);
        assert_eq!(cal.day_type(Weekday::Sat), DayType::NonWorking);
        assert_eq!(cal.hours(Weekday::Wed), &shifts);
        assert!(cal.hours(Weekday::Sat).is_empty());
        assert!(cal.is_working_date(date(2024, 1, 3)));
        assert_eq!(cal.start_time(date(2024, 1, 3)), Some(hm(8, 0)));
    }

    #[test]
    fn test_working_day_without_hours_gets_standard_shifts() {
        let mut calendars = ProjectCalendars::new();
        let id = calendars.add_calendar("bare");
        calendars
            .calendar_mut(id)
            .unwrap()
            .set_working_day(Weekday::Sat, true)
            .set_day_type(Weekday::Sun, DayType::Working)
            .set_calendar_hours(Weekday::Sun, Vec::new());
        let cal = calendars.calendar(id).unwrap();
        let shifts = [default_working_morning(), default_working_afternoon()];
        assert_eq!(cal.hours(Weekday::Sat), &shifts);
        assert_eq!(cal.hours(Weekday::Sun), &shifts);

        // a derived working day whose parent does not work that day
        let (mut calendars, base) = standard();
        let derived = calendars.add_default_derived_calendar(base).unwrap();
        calendars
            .calendar_mut(derived)
            .unwrap()
            .set_day_type(Weekday::Sat, DayType::Working);
        let cal = calendars.calendar(derived).unwrap();
        assert_eq!(cal.day_type(Weekday::Sat), DayType::Working);
        assert_eq!(cal.hours(Weekday::Sat), &shifts);
    }

    #[test]
    fn test_remove_calendar_detaches_children() {
        let (mut calendars, base) = standard();
        let derived = calendars.add_default_derived_calendar(base).unwrap();
        assert!(calendars.remove_calendar(base).is_some());
        let cal = calendars.calendar(derived).unwrap();
        assert!(cal.parent().is_none());
        // every day is Default, so the weekday rule now applies
        assert_eq!(cal.hours(Weekday::Mon), &[default_working_morning(), default_working_afternoon()]);
        assert!(cal.hours(Weekday::Sun).is_empty());
        assert!(calendars.remove_calendar(base).is_none());
    }

    #[test]
    fn test_edit_handle_returns_calendar_on_drop() {
        let (mut calendars, id) = standard();
        {
            let mut cal = calendars.calendar_mut(id).unwrap();
            cal.set_name("Office").set_working_day(Weekday::Sat, true);
            assert_eq!(cal.id(), id);
            assert_eq!(cal.calendar().map(Calendar::name), Some("Office"));
            assert!(format!("{cal:?}").contains("Office"));
        }
        assert_eq!(calendars.len(), 1);
        let cal = calendars.calendar(id).unwrap();
        assert_eq!(cal.name(), "Office");
        assert!(cal.is_working_day(Weekday::Sat));
        assert!(calendars.calendar_mut(CalendarId(7)).is_none());
    }

    #[test]
    fn test_combined_calendar_intersects_hours() {
        let (mut calendars, task) = standard();
        let resource = calendars.add_calendar("Part time");
        {
            let mut cal = calendars.calendar_mut(resource).unwrap();
            for day in [Weekday::Mon, Weekday::Tue, Weekday::Thu] {
                cal.set_working_day(day, true)
                    .set_calendar_hours(day, vec![TimeRange::from_hm((10, 0), (15, 0))]);
            }
            cal.set_working_day(Weekday::Wed, true)
                .set_calendar_hours(Weekday::Wed, vec![TimeRange::from_hm((17, 0), (20, 0))])
                .set_working_day(Weekday::Fri, false)
                .set_working_day(Weekday::Sat, true)
                .add_calendar_hours(Weekday::Sat, TimeRange::from_hm((9, 0), (12, 0)));
            cal.add_calendar_exception(date(2024, 12, 24), date(2024, 12, 24));
        }
        calendars
            .calendar_mut(task)
            .unwrap()
            .add_calendar_exception(date(2024, 12, 25), date(2024, 12, 25));

        let combined = calendars.add_combined_calendar(task, resource).unwrap();
        let cal = calendars.calendar(combined).unwrap();
        assert_eq!(cal.name(), "Standard / Part time");
        assert!(cal.parent().is_none());
        assert_eq!(cal.calendar().kind(), CalendarKind::Resource);
        assert_eq!(
            cal.hours(Weekday::Mon),
            &[TimeRange::from_hm((10, 0), (12, 0)), TimeRange::from_hm((13, 0), (15, 0))]
        );
        // both working, but no hours in common
        assert_eq!(cal.day_type(Weekday::Wed), DayType::NonWorking);
        assert_eq!(cal.day_type(Weekday::Fri), DayType::NonWorking);
        assert_eq!(cal.day_type(Weekday::Sat), DayType::NonWorking);
        assert!(cal.hours(Weekday::Sun).is_empty());

        assert_eq!(cal.calendar().exceptions().len(), 2);
        assert_eq!(cal.calendar().exceptions()[0].from(), date(2024, 12, 25));
        // Tuesday 2024-12-24 and Wednesday 2024-12-25
        assert!(!cal.is_working_date(date(2024, 12, 24)));
        assert!(!cal.is_working_date(date(2024, 12, 25)));
        assert!(cal.is_working_date(date(2024, 12, 23)));

        assert_eq!(
            calendars.add_combined_calendar(task, CalendarId(99)),
            Err(CalendarError::UnknownCalendar(CalendarId(99)))
        );
    }

    #[test]
    fn test_copy_calendar_is_independent() {
        let (mut calendars, base) = standard();
        let derived = calendars.add_default_derived_calendar(base).unwrap();
        {
            let mut cal = calendars.calendar_mut(derived).unwrap();
            cal.set_name("Site")
                .set_working_day(Weekday::Sat, true)
                .set_minutes_per_day(Some(420))
                .set_personal(true);
            cal.add_calendar_exception(date(2024, 5, 1), date(2024, 5, 1));
            cal.add_work_week(LocalDateRange::new(date(2024, 8, 1), date(2024, 8, 31)))
                .days_mut()
                .set_working_day(Weekday::Fri, false);
        }

        let copy = calendars.copy_calendar(derived).unwrap();
        assert_ne!(copy, derived);
        {
            let cal = calendars.calendar(copy).unwrap();
            assert_eq!(cal.name(), "Site");
            assert_eq!(cal.parent().unwrap().id(), base);
            assert!(cal.is_working_day(Weekday::Sat));
            assert_eq!(cal.minutes_per_day(), 420);
            assert!(cal.calendar().is_personal());
            assert!(!cal.is_working_date(date(2024, 5, 1)));
            assert!(!cal.is_working_date(date(2024, 8, 2)));
        }
        assert_eq!(calendars.derived_calendars(base), vec![derived, copy]);

        calendars.calendar_mut(copy).unwrap().clear_calendar_exceptions();
        assert!(calendars.calendar(copy).unwrap().is_working_date(date(2024, 5, 1)));
        assert!(!calendars.calendar(derived).unwrap().is_working_date(date(2024, 5, 1)));
        assert_eq!(
            calendars.copy_calendar(CalendarId(99)),
            Err(CalendarError::UnknownCalendar(CalendarId(99)))
        );
    }

    // ── parent assignment ───────────────────────────────────────────────

    #[test]
    fn test_self_parent_is_ignored() {
        let (mut calendars, base) = standard();
        let derived = calendars.add_default_derived_calendar(base).unwrap();
        calendars.set_parent(derived, Some(derived)).unwrap();
        assert_eq!(calendars.calendar(derived).unwrap().calendar().parent_id(), Some(base));
    }

    #[test]
    fn test_parent_cycle_is_rejected() {
        let (mut calendars, base) = standard();
        let a = calendars.add_default_derived_calendar(base).unwrap();
        let b = calendars.add_default_derived_calendar(a).unwrap();
        assert_eq!(
            calendars.set_parent(base, Some(b)),
            Err(CalendarError::ParentCycle {
                calendar: base,
                parent: b
            })
        );
        assert_eq!(calendars.calendar(base).unwrap().calendar().parent_id(), None);
    }

    #[test]
    fn test_set_parent_unknown() {
        let (mut calendars, base) = standard();
        assert_eq!(
            calendars.set_parent(base, Some(CalendarId(42))),
            Err(CalendarError::UnknownCalendar(CalendarId(42)))
        );
        assert_eq!(
            calendars.set_parent(CalendarId(42), None),
            Err(CalendarError::UnknownCalendar(CalendarId(42)))
        );
    }

    #[test]
    fn test_clear_parent() {
        let (mut calendars, base) = standard();
        let derived = calendars.add_default_derived_calendar(base).unwrap();
        calendars.set_parent(derived, None).unwrap();
        assert!(calendars.derived_calendars(base).is_empty());
    }

    // ── resolution by date ──────────────────────────────────────────────

    #[test]
    fn test_exception_makes_date_non_working() {
        let (mut calendars, id) = standard();
        calendars
            .calendar_mut(id)
            .unwrap()
            .add_calendar_exception(date(2024, 12, 25), date(2024, 12, 26))
            .set_name("Christmas");
        let cal = calendars.calendar(id).unwrap();
        assert!(!cal.is_working_date(date(2024, 12, 25)));
        assert!(!cal.is_working_date(date(2024, 12, 26)));
        assert!(cal.is_working_date(date(2024, 12, 27)));
        assert_eq!(cal.exception(date(2024, 12, 25)).unwrap().name(), Some("Christmas"));
    }

    #[test]
    fn test_working_exception_on_weekend() {
        let (mut calendars, id) = standard();
        calendars
            .calendar_mut(id)
            .unwrap()
            .add_calendar_exception(date(2024, 1, 6), date(2024, 1, 6))
            .add_range(TimeRange::from_hm((9, 0), (13, 0)));
        let cal = calendars.calendar(id).unwrap();
        assert_eq!(cal.hours_for_date(date(2024, 1, 6)), &[TimeRange::from_hm((9, 0), (13, 0))]);
        assert_eq!(cal.start_time(date(2024, 1, 6)), Some(hm(9, 0)));
        assert_eq!(cal.finish_time(date(2024, 1, 6)), Some(hm(13, 0)));
    }

    #[test]
    fn test_parent_exception_seen_by_derived() {
        let (mut calendars, base) = standard();
        let derived = calendars.add_default_derived_calendar(base).unwrap();
        calendars
            .calendar_mut(base)
            .unwrap()
            .add_calendar_exception(date(2024, 7, 4), date(2024, 7, 4));
        assert!(!calendars.calendar(derived).unwrap().is_working_date(date(2024, 7, 4)));
    }

    #[test]
    fn test_recurring_exception_resolves_by_date() {
        let (mut calendars, id) = standard();
        let rule = RecurrenceRule::new(RecurrenceType::Weekly, date(2024, 1, 1))
            .with_weekday(Weekday::Mon)
            .with_occurrences(3);
        calendars.calendar_mut(id).unwrap().add_recurring_exception(rule);
        let cal = calendars.calendar(id).unwrap();
        assert!(!cal.is_working_date(date(2024, 1, 8)));
        assert!(cal.is_working_date(date(2024, 1, 9)));
        assert!(cal.is_working_date(date(2024, 1, 22)));
        assert_eq!(cal.expanded_exceptions().len(), 3);
    }

    #[test]
    fn test_working_days_only_recurrence_skips_overlay_days_off() {
        let (mut calendars, id) = standard();
        {
            let mut cal = calendars.calendar_mut(id).unwrap();
            cal.add_work_week(LocalDateRange::new(date(2024, 1, 1), date(2024, 1, 31)))
                .days_mut()
                .set_day_type(Weekday::Fri, DayType::NonWorking);
            // from Thursday 2024-01-04, three working days
            let rule = RecurrenceRule::new(RecurrenceType::Daily, date(2024, 1, 4))
                .with_working_days_only(true)
                .with_occurrences(3);
            cal.add_recurring_exception(rule).set_name("Stocktake");
        }
        let cal = calendars.calendar(id).unwrap();
        let dates: Vec<_> = cal.expanded_exceptions().iter().map(|e| e.from()).collect();
        assert_eq!(dates, vec![date(2024, 1, 4), date(2024, 1, 8), date(2024, 1, 9)]);
        assert!(cal.exception(date(2024, 1, 5)).is_none());
        assert!(!cal.is_working_date(date(2024, 1, 5)));
        assert_eq!(cal.exception(date(2024, 1, 8)).unwrap().name(), Some("Stocktake"));
        assert!(cal.is_working_date(date(2024, 1, 10)));
    }

    #[test]
    fn test_work_week_overlay() {
        let (mut calendars, id) = standard();
        {
            let mut cal = calendars.calendar_mut(id).unwrap();
            let week = cal.add_work_week(LocalDateRange::new(date(2024, 7, 1), date(2024, 8, 31)));
            week.set_name("Summer");
            let days = week.days_mut();
            days.set_day_type(Weekday::Fri, DayType::NonWorking);
            days.set_day_type(Weekday::Mon, DayType::Working);
            days.set_calendar_hours(Weekday::Mon, vec![TimeRange::from_hm((7, 0), (15, 0))]);
            days.set_day_type(Weekday::Tue, DayType::Working);
        }
        let cal = calendars.calendar(id).unwrap();
        // Friday 2024-07-05 is off, Monday 2024-07-08 runs 07:00-15:00
        assert!(!cal.is_working_date(date(2024, 7, 5)));
        assert_eq!(cal.start_time(date(2024, 7, 8)), Some(hm(7, 0)));
        // Tuesday has no hours of its own in the overlay
        assert_eq!(cal.hours_for_date(date(2024, 7, 9)).len(), 2);
        // Wednesday is Default in the overlay and follows the regular week
        assert_eq!(cal.hours_for_date(date(2024, 7, 10)).len(), 2);
        assert!(cal.is_working_date(date(2024, 9, 6)));
        assert_eq!(cal.work_week(date(2024, 7, 10)).unwrap().name(), Some("Summer"));
    }

    #[test]
    fn test_exception_beats_work_week() {
        let (mut calendars, id) = standard();
        {
            let mut cal = calendars.calendar_mut(id).unwrap();
            cal.add_work_week(LocalDateRange::new(date(2024, 7, 1), date(2024, 7, 31)))
                .days_mut()
                .set_working_day(Weekday::Sat, true);
            cal.add_calendar_exception(date(2024, 7, 6), date(2024, 7, 6));
        }
        let cal = calendars.calendar(id).unwrap();
        assert!(!cal.is_working_date(date(2024, 7, 6)));
    }

    #[test]
    fn test_midnight_finish_time() {
        let mut calendars = ProjectCalendars::new();
        let id = calendars.add_calendar("late");
        calendars
            .calendar_mut(id)
            .unwrap()
            .set_working_day(Weekday::Mon, true)
            .add_calendar_hours(Weekday::Mon, TimeRange::from_hm((16, 0), (0, 0)));
        let cal = calendars.calendar(id).unwrap();
        assert_eq!(cal.finish_time(date(2024, 1, 1)), Some(hm(0, 0)));
        assert_eq!(cal.start_time(date(2024, 1, 1)), Some(hm(16, 0)));
        assert_eq!(cal.start_time(date(2024, 1, 6)), None);
        assert_eq!(cal.finish_time(date(2024, 1, 6)), None);
    }

    // ── invalidation ────────────────────────────────────────────────────

    #[test]
    fn test_base_change_reaches_derived_calendar() {
        let (mut calendars, base) = standard();
        let derived = calendars.add_default_derived_calendar(base).unwrap();
        let grandchild = calendars.add_default_derived_calendar(derived).unwrap();

        // warm the caches
        let monday = date(2024, 1, 1);
        assert_eq!(calendars.calendar(grandchild).unwrap().start_time(monday), Some(hm(8, 0)));

        calendars
            .calendar_mut(base)
            .unwrap()
            .set_calendar_hours(Weekday::Mon, vec![TimeRange::from_hm((6, 0), (14, 0))]);

        let cal = calendars.calendar(grandchild).unwrap();
        assert_eq!(cal.start_time(monday), Some(hm(6, 0)));
        assert_eq!(cal.hours(Weekday::Mon), &[TimeRange::from_hm((6, 0), (14, 0))]);
    }

    #[test]
    fn test_exception_edit_clears_expansion() {
        let (mut calendars, id) = standard();
        calendars
            .calendar_mut(id)
            .unwrap()
            .add_calendar_exception(date(2024, 3, 4), date(2024, 3, 4));
        assert!(!calendars.calendar(id).unwrap().is_working_date(date(2024, 3, 4)));

        calendars
            .calendar_mut(id)
            .unwrap()
            .exception_mut(0)
            .unwrap()
            .add_range(TimeRange::from_hm((10, 0), (11, 0)));
        assert!(calendars.calendar(id).unwrap().is_working_date(date(2024, 3, 4)));

        calendars.calendar_mut(id).unwrap().clear_calendar_exceptions();
        let cal = calendars.calendar(id).unwrap();
        assert_eq!(cal.hours_for_date(date(2024, 3, 4)).len(), 2);
    }

    #[test]
    fn test_recurrence_edit_through_exception() {
        let (mut calendars, id) = standard();
        let rule = RecurrenceRule::new(RecurrenceType::Daily, date(2024, 1, 1)).with_occurrences(1);
        calendars.calendar_mut(id).unwrap().add_recurring_exception(rule);
        assert!(calendars.calendar(id).unwrap().is_working_date(date(2024, 1, 2)));

        calendars
            .calendar_mut(id)
            .unwrap()
            .exception_mut(0)
            .and_then(CalendarException::recurrence_mut)
            .unwrap()
            .set_occurrences(Some(2));
        assert!(!calendars.calendar(id).unwrap().is_working_date(date(2024, 1, 2)));
    }

    // ── units ───────────────────────────────────────────────────────────

    #[test]
    fn test_minutes_per_unit_fall_back() {
        let props = ProjectProperties {
            minutes_per_day: 450,
            ..Default::default()
        };
        let mut calendars = ProjectCalendars::with_properties(props);
        let base = calendars.add_default_base_calendar();
        let derived = calendars.add_default_derived_calendar(base).unwrap();
        assert_eq!(calendars.calendar(derived).unwrap().minutes_per_day(), 450);

        calendars
            .calendar_mut(base)
            .unwrap()
            .set_minutes_per_day(Some(420))
            .set_minutes_per_week(Some(2100));
        let cal = calendars.calendar(derived).unwrap();
        assert_eq!(cal.minutes_per_day(), 420);
        assert_eq!(cal.minutes_per_week(), 2100);
        assert_eq!(cal.minutes_per_month(), 9600);
        assert_eq!(cal.days_per_month(), 20);
    }

    #[test]
    fn test_kind_and_personal_flags() {
        let (mut calendars, id) = standard();
        calendars
            .calendar_mut(id)
            .unwrap()
            .set_kind(CalendarKind::Resource)
            .set_personal(true)
            .set_name("Alex");
        let cal = calendars.calendar(id).unwrap().calendar();
        assert_eq!(cal.kind(), CalendarKind::Resource);
        assert!(cal.is_personal());
        assert_eq!(cal.name(), "Alex");
    }
}
