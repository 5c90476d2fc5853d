//! Pacing and the will gate
//!
//! Pace is measured in metric units per day. The required pace is the linear
//! rate from adoption to the target date; the actual pace is the latest value
//! divided by the days elapsed since adoption. Both day counts include the
//! adoption day, so a goal that gains the same amount every day sits exactly
//! on pace.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use stride_graph::{DailySnapshot, GoalId, GoalRecord};

/// Pace of a single goal on a given day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PacingInfo {
    /// Goal id
    pub goal_id: GoalId,
    /// Day the pace was measured on
    pub as_of: NaiveDate,
    /// Latest value on or before `as_of`
    pub current_value: f64,
    /// Value that counts as done
    pub target_value: f64,
    /// Units still missing
    pub remaining: f64,
    /// Days since adoption, counting the adoption day
    pub days_elapsed: i64,
    /// Days until the target date; negative when overdue, `None` without one
    pub days_remaining: Option<i64>,
    /// Units per day needed to finish on time, over the adoption day through
    /// the target date inclusive; 0 without a target date
    pub required_pace: f64,
    /// Units per day achieved so far
    pub actual_pace: f64,
    /// Finish date at the actual pace, `None` when the pace is zero
    pub projected_completion: Option<NaiveDate>,
}

impl PacingInfo {
    /// Whether the goal keeps up with the required pace
    #[inline]
    #[must_use]
    pub fn on_track(&self) -> bool {
        self.remaining <= 0.0 || self.actual_pace >= self.required_pace
    }
}

/// Why a goal is or is not gated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GateReason {
    /// Pace is within tolerance
    OnPace,
    /// Pace is below tolerance
    BehindPace,
    /// No target date, nothing to pace against
    NoDeadline,
    /// Target value already reached
    Completed,
    /// Archived or frozen goals never gate
    Inactive,
}

/// Result of the will-gate check
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WillGateResult {
    /// Promotion of dependent goals is blocked
    pub gated: bool,
    /// Reason for the decision
    pub reason: GateReason,
    /// Units per day missing versus the required pace, 0 when on pace
    pub deficit: f64,
}

/// Days from `start` through `end`, both ends counted, at least 1
fn inclusive_days(start: NaiveDate, end: NaiveDate) -> i64 {
    ((end - start).num_days() + 1).max(1)
}

/// Measure the pace of `goal` on `today`.
///
/// Only snapshots of `goal` dated on or before `today` are considered; without
/// any, the value is 0.
#[must_use]
pub fn compute_pacing(
    goal: &GoalRecord,
    target_value: f64,
    snapshots: &[DailySnapshot],
    today: NaiveDate,
) -> PacingInfo {
    let current_value = snapshots
        .iter()
        .filter(|s| s.goal_id == goal.id && s.date <= today)
        .max_by_key(|s| s.date)
        .map_or(0.0, |s| s.value);

    let start = goal.created_at.date_naive();
    let days_elapsed = inclusive_days(start, today);
    let actual_pace = current_value.max(0.0) / days_elapsed as f64;
    let remaining = (target_value - current_value).max(0.0);

    let required_pace = goal.target_date.map_or(0.0, |target| {
        target_value / inclusive_days(start, target) as f64
    });
    let days_remaining = goal.target_date.map(|target| (target - today).num_days());

    let projected_completion = if remaining <= 0.0 {
        Some(today)
    } else if actual_pace > 0.0 {
        let days = (remaining / actual_pace).ceil();
        if days.is_finite() && days < f64::from(u32::MAX) {
            today.checked_add_days(Days::new(days as u64))
        } else {
            None
        }
    } else {
        None
    };

    PacingInfo {
        goal_id: goal.id.clone(),
        as_of: today,
        current_value,
        target_value,
        remaining,
        days_elapsed,
        days_remaining,
        required_pace,
        actual_pace,
        projected_completion,
    }
}

/// Gate `goal` when its actual pace is below `required × (1 − tolerance)`
#[must_use]
pub fn compute_will_gate(goal: &GoalRecord, pacing: &PacingInfo, tolerance: f64) -> WillGateResult {
    let open = |reason| WillGateResult {
        gated: false,
        reason,
        deficit: 0.0,
    };
    if goal.archived || goal.frozen {
        return open(GateReason::Inactive);
    }
    if pacing.remaining <= 0.0 {
        return open(GateReason::Completed);
    }
    if goal.target_date.is_none() || pacing.required_pace <= 0.0 {
        return open(GateReason::NoDeadline);
    }

    let deficit = (pacing.required_pace - pacing.actual_pace).max(0.0);
    if pacing.actual_pace < pacing.required_pace * (1.0 - tolerance) {
        tracing::debug!(goal = %goal.id, deficit, "goal gated behind pace");
        WillGateResult {
            gated: true,
            reason: GateReason::BehindPace,
            deficit,
        }
    } else {
        WillGateResult {
            gated: false,
            reason: GateReason::OnPace,
            deficit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, day).unwrap()
    }

    /// Adopted 2025-01-01, 100 units due 2025-04-10 (100 days): 1 unit/day
    fn goal() -> GoalRecord {
        GoalRecord::new("g", "t", Utc.with_ymd_and_hms(2025, 1, 1, 8, 0, 0).unwrap())
            .with_target_date(d(4, 10))
    }

    #[test]
    fn measures_linear_paces() {
        let snaps = vec![
            DailySnapshot::new("g", d(1, 5), 3.0),
            DailySnapshot::new("g", d(1, 10), 10.0),
            DailySnapshot::new("g", d(1, 20), 99.0),
        ];
        let pacing = compute_pacing(&goal(), 100.0, &snaps, d(1, 10));
        assert_eq!(pacing.current_value, 10.0);
        assert_eq!(pacing.days_elapsed, 10);
        assert!((pacing.actual_pace - 1.0).abs() < 1e-9);
        assert!((pacing.required_pace - 1.0).abs() < 1e-9);
        assert_eq!(pacing.days_remaining, Some(90));
        assert_eq!(pacing.projected_completion, Some(d(4, 10)));
        assert!(pacing.on_track());
    }

    #[test]
    fn steady_progress_is_exactly_on_pace() {
        let start = d(1, 1);
        for offset in 0..100u64 {
            let today = start + Days::new(offset);
            let snaps = vec![DailySnapshot::new("g", today, (offset + 1) as f64)];
            let pacing = compute_pacing(&goal(), 100.0, &snaps, today);
            assert!(pacing.on_track(), "{today}: {pacing:?}");
            assert!(!compute_will_gate(&goal(), &pacing, 0.0).gated, "{today}");
        }
        let last = compute_pacing(&goal(), 100.0, &[DailySnapshot::new("g", d(4, 10), 99.5)], d(4, 10));
        assert!((last.actual_pace - last.required_pace * 0.995).abs() < 1e-9);
    }

    #[test]
    fn gates_only_beyond_tolerance() {
        let ten_pct = |value: f64| {
            let snaps = vec![DailySnapshot::new("g", d(1, 10), value)];
            let pacing = compute_pacing(&goal(), 100.0, &snaps, d(1, 10));
            compute_will_gate(&goal(), &pacing, 0.1)
        };
        assert!(!ten_pct(9.5).gated);
        let behind = ten_pct(5.0);
        assert!(behind.gated);
        assert_eq!(behind.reason, GateReason::BehindPace);
        assert!((behind.deficit - 0.5).abs() < 1e-9);
    }

    #[test]
    fn undated_frozen_and_done_goals_never_gate() {
        let undated = GoalRecord::new("g", "t", Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
        let pacing = compute_pacing(&undated, 100.0, &[], d(2, 1));
        assert_eq!(compute_will_gate(&undated, &pacing, 0.1).reason, GateReason::NoDeadline);

        let frozen = goal().frozen();
        let pacing = compute_pacing(&frozen, 100.0, &[], d(2, 1));
        assert_eq!(compute_will_gate(&frozen, &pacing, 0.1).reason, GateReason::Inactive);

        let snaps = vec![DailySnapshot::new("g", d(1, 3), 150.0)];
        let pacing = compute_pacing(&goal(), 100.0, &snaps, d(2, 1));
        let gate = compute_will_gate(&goal(), &pacing, 0.1);
        assert_eq!(gate.reason, GateReason::Completed);
        assert!(!gate.gated);
    }
}
