//! Cadence, staleness and weekly grouping

use crate::calendar::WeekCalendar;
use crate::tree::{GoalTree, GoalWithProgress};
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;
use stride_graph::{Cadence, DailySnapshot, GoalId, GoalRecord};

/// Whether `goal` expects an action on `date`.
///
/// Daily cadence schedules every day, weekly cadence its designated weekday,
/// unscheduled goals never. Archived and frozen goals are never actionable,
/// nor is any day before adoption.
#[must_use]
pub fn is_daily_actionable(goal: &GoalRecord, cadence: Cadence, date: NaiveDate) -> bool {
    if goal.archived || goal.frozen || date < goal.created_at.date_naive() {
        return false;
    }
    cadence.schedules(date.weekday())
}

/// Bucket snapshots by ISO week (`YYYY-Www`), weeks ascending, input order
/// kept inside each bucket
#[must_use]
pub fn group_snapshots_into_weeks<'a, C: WeekCalendar + ?Sized>(
    calendar: &C,
    snapshots: &'a [DailySnapshot],
) -> BTreeMap<String, Vec<&'a DailySnapshot>> {
    let mut weeks: BTreeMap<String, Vec<&DailySnapshot>> = BTreeMap::new();
    for snap in snapshots {
        weeks
            .entry(calendar.iso_week_string(snap.date))
            .or_default()
            .push(snap);
    }
    weeks
}

/// Whether a goal idle since `last_update` should be frozen on `now`.
///
/// True once `now − last_update` reaches `threshold_days`, unless the goal is
/// already frozen, completed or archived.
#[must_use]
pub fn should_auto_freeze(
    goal: &GoalWithProgress,
    last_update: NaiveDate,
    now: NaiveDate,
    threshold_days: u32,
) -> bool {
    if goal.frozen || goal.completed || goal.archived {
        return false;
    }
    (now - last_update).num_days() >= i64::from(threshold_days)
}

/// Every goal in `tree` that should be frozen on `now`, measured from its last
/// activity (row update or snapshot)
#[must_use]
pub fn goals_to_auto_freeze(tree: &GoalTree, now: NaiveDate, threshold_days: u32) -> Vec<GoalId> {
    let stale: Vec<GoalId> = tree
        .goals()
        .into_iter()
        .filter(|g| should_auto_freeze(g, g.last_activity_date(), now, threshold_days))
        .map(|g| g.id.clone())
        .collect();
    if !stale.is_empty() {
        tracing::info!(count = stale.len(), %now, "goals due for auto-freeze");
    }
    stale
}

/// Days from the most recent snapshot of `goal_id` to `now`, `None` without
/// snapshots. Snapshots dated after `now` count as today.
#[must_use]
pub fn get_goal_staleness(
    goal_id: &GoalId,
    snapshots: &[DailySnapshot],
    now: NaiveDate,
) -> Option<i64> {
    snapshots
        .iter()
        .filter(|s| &s.goal_id == goal_id)
        .map(|s| s.date)
        .max()
        .map(|last| (now - last).num_days().max(0))
}

/// Length of the run of consecutive days ending on the latest day in `days`
/// that is on or before `end`. Zero if that day is before `start`.
#[must_use]
pub fn streak_ending(days: &[NaiveDate], start: NaiveDate, end: NaiveDate) -> u32 {
    let mut sorted: Vec<NaiveDate> = days.iter().copied().filter(|d| *d <= end).collect();
    sorted.sort_unstable();
    sorted.dedup();
    let Some(&last) = sorted.last() else {
        return 0;
    };
    if last < start {
        return 0;
    }
    let mut streak = 1;
    let mut cursor = last;
    for day in sorted.iter().rev().skip(1) {
        if day.succ_opt() != Some(cursor) {
            break;
        }
        streak += 1;
        cursor = *day;
    }
    streak
}
