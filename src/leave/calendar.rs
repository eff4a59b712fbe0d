//! Working-day arithmetic.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{Datelike, Duration, NaiveDate, Weekday};

use crate::error::{LeaveError, LeaveResult};
use crate::leave::types::Days;

/// Source of non-working dates besides weekends
pub trait HolidayCalendar: Send + Sync {
    /// Holidays falling within `start..=end`
    fn holidays_between(&self, start: NaiveDate, end: NaiveDate) -> BTreeSet<NaiveDate>;
}

/// Only weekends are excluded
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHolidays;

impl HolidayCalendar for NoHolidays {
    fn holidays_between(&self, _start: NaiveDate, _end: NaiveDate) -> BTreeSet<NaiveDate> {
        BTreeSet::new()
    }
}

#[derive(Debug, Clone, Default)]
pub struct HolidaySet {
    dates: BTreeSet<NaiveDate>,
}

impl HolidaySet {
    pub fn new(dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            dates: dates.into_iter().collect(),
        }
    }
}

impl HolidayCalendar for HolidaySet {
    fn holidays_between(&self, start: NaiveDate, end: NaiveDate) -> BTreeSet<NaiveDate> {
        if start > end {
            return BTreeSet::new();
        }
        self.dates.range(start..=end).copied().collect()
    }
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Chargeable days between two dates inclusive, weekends excluded.
pub fn compute_duration(start: NaiveDate, end: NaiveDate, half_day: bool) -> LeaveResult<Days> {
    WorkingDayCalculator::default().duration(start, end, half_day)
}

#[derive(Clone)]
pub struct WorkingDayCalculator {
    holidays: Arc<dyn HolidayCalendar>,
}

impl Default for WorkingDayCalculator {
    fn default() -> Self {
        Self::new(Arc::new(NoHolidays))
    }
}

impl WorkingDayCalculator {
    pub fn new(holidays: Arc<dyn HolidayCalendar>) -> Self {
        Self { holidays }
    }

    /// A half-day is always 0.5 and must start and end on the same date.
    pub fn duration(&self, start: NaiveDate, end: NaiveDate, half_day: bool) -> LeaveResult<Days> {
        if start > end {
            return Err(LeaveError::InvalidRange { start, end });
        }
        if half_day {
            if start != end {
                return Err(LeaveError::InvalidHalfDayRange { start, end });
            }
            return Ok(Days::HALF);
        }
        Ok(Days::whole(self.working_days(start, end)))
    }

    /// Whole weeks count five days each; only the trailing partial week and
    /// the holidays are inspected one by one.
    fn working_days(&self, start: NaiveDate, end: NaiveDate) -> u32 {
        let span = (end - start).num_days() + 1;
        let weeks = span / 7;
        let tail = (weeks * 7..span)
            .map(|offset| start + Duration::days(offset))
            .filter(|d| !is_weekend(*d))
            .count() as i64;

        let holidays = self
            .holidays
            .holidays_between(start, end)
            .into_iter()
            .filter(|d| !is_weekend(*d))
            .count() as i64;

        (weeks * 5 + tail - holidays) as u32
    }

    pub fn is_working_day(&self, date: NaiveDate) -> bool {
        !is_weekend(date) && !self.holidays.holidays_between(date, date).contains(&date)
    }
}
