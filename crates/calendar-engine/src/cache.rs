//! Per-calendar memoization of derived working-time data.
//!
//! Everything here is derived from the calendar's definition and its
//! ancestors, so the owning container clears it whenever the calendar or any
//! calendar it derives from changes. All parts are internally synchronized,
//! which keeps a built container shareable across threads for queries.

use std::fmt;
use std::sync::{Mutex, OnceLock};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use moka::sync::Cache;

use crate::exception::CalendarException;
use crate::range::LocalDateRange;

/// Upper bound on memoized `(start, end)` work totals per calendar.
const WORK_CACHE_CAPACITY: u64 = 4096;

/// Upper bound on memoized start times per calendar.
const START_TIME_CACHE_CAPACITY: u64 = 1024;

/// Outcome of the most recent forward projection, reused when the next call
/// starts from the same instant and asks for at least as much work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Projection {
    pub start: NaiveDateTime,
    pub work_ms: i64,
    /// Exact finish, before truncation to whole seconds.
    pub finish: NaiveDateTime,
    /// True when `finish` sits on the end of a working period.
    pub on_boundary: bool,
}

pub(crate) struct WorkingTimeCache {
    /// Exceptions with recurring entries expanded, sorted by date.
    pub expanded: OnceLock<Vec<CalendarException>>,
    /// Work-week overlays sorted by validity range, with their index.
    pub weeks: OnceLock<Vec<(LocalDateRange, usize)>>,
    /// Signed working milliseconds between two instants.
    pub work: Cache<(NaiveDateTime, NaiveDateTime), i64>,
    pub start_times: Cache<NaiveDate, Option<NaiveTime>>,
    pub last_projection: Mutex<Option<Projection>>,
}

impl Default for WorkingTimeCache {
    fn default() -> Self {
        Self {
            expanded: OnceLock::new(),
            weeks: OnceLock::new(),
            work: Cache::new(WORK_CACHE_CAPACITY),
            start_times: Cache::new(START_TIME_CACHE_CAPACITY),
            last_projection: Mutex::new(None),
        }
    }
}

impl WorkingTimeCache {
    pub fn clear(&mut self) {
        self.expanded.take();
        self.weeks.take();
        self.work.invalidate_all();
        self.start_times.invalidate_all();
        *self
            .last_projection
            .get_mut()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
    }

    pub fn last_projection(&self) -> Option<Projection> {
        *self
            .last_projection
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn set_last_projection(&self, projection: Option<Projection>) {
        *self
            .last_projection
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = projection;
    }
}

impl fmt::Debug for WorkingTimeCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkingTimeCache")
            .field("expanded", &self.expanded.get().map(Vec::len))
            .field("weeks", &self.weeks.get().map(Vec::len))
            .field("work", &self.work.entry_count())
            .field("start_times", &self.start_times.entry_count())
            .finish()
    }
}
