//! ISO week helpers
//!
//! The persistence layer owns the canonical week helpers; the engine only
//! sees them through [`WeekCalendar`]. [`IsoWeekCalendar`] is the chrono
//! implementation used when no other calendar is injected.

use chrono::{Datelike, Days, NaiveDate, Weekday};
use stride_graph::DailySnapshot;

/// Week-string helpers consumed by streak and grouping code
pub trait WeekCalendar {
    /// Week containing `date`, formatted `YYYY-Www`
    fn iso_week_string(&self, date: NaiveDate) -> String;

    /// Whether `later` is the week directly after `earlier`
    fn are_weeks_consecutive(&self, earlier: &str, later: &str) -> bool;

    /// Whether any snapshot falls inside `week`
    fn is_week_active(&self, week: &str, snapshots: &[DailySnapshot]) -> bool {
        snapshots
            .iter()
            .any(|s| self.iso_week_string(s.date) == week)
    }

    /// Monday and Sunday of the week containing `date`
    fn week_bounds(&self, date: NaiveDate) -> (NaiveDate, NaiveDate) {
        let offset = u64::from(date.weekday().num_days_from_monday());
        let monday = date.checked_sub_days(Days::new(offset)).unwrap_or(date);
        let sunday = monday.checked_add_days(Days::new(6)).unwrap_or(monday);
        (monday, sunday)
    }
}

/// ISO-8601 weeks (Monday start, week 1 contains the first Thursday)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IsoWeekCalendar;

impl IsoWeekCalendar {
    /// Monday of a `YYYY-Www` week, `None` if the string is malformed or the
    /// week does not exist in that year
    #[must_use]
    pub fn parse_week(week: &str) -> Option<NaiveDate> {
        let (year, number) = week.split_once("-W")?;
        let year: i32 = year.parse().ok()?;
        let number: u32 = number.parse().ok()?;
        NaiveDate::from_isoywd_opt(year, number, Weekday::Mon)
    }
}

impl WeekCalendar for IsoWeekCalendar {
    fn iso_week_string(&self, date: NaiveDate) -> String {
        let week = date.iso_week();
        format!("{:04}-W{:02}", week.year(), week.week())
    }

    fn are_weeks_consecutive(&self, earlier: &str, later: &str) -> bool {
        match (Self::parse_week(earlier), Self::parse_week(later)) {
            (Some(a), Some(b)) => a.checked_add_days(Days::new(7)) == Some(b),
            _ => false,
        }
    }
}
