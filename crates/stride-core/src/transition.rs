//! Phase transition ("graduation") detection
//!
//! A goal graduates once its progress stays at or above the rule threshold
//! for `k` consecutive calendar days. A missing day or a day below the
//! threshold resets the run, so single-day spikes never fire.

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use stride_graph::{
    DailySnapshot, GoalGraph, GoalId, GoalRecord, GoalTemplate, GraduationRule, Phase,
};
use stride_milestone::leaf_progress;

/// A goal moving to its next phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseTransition {
    /// Goal id
    pub goal_id: GoalId,
    /// Phase left
    pub from_phase: Phase,
    /// Phase entered
    pub to_phase: Phase,
    /// The k-th qualifying day
    pub date: NaiveDate,
}

/// Progress fell back under the threshold of a past graduation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraduationRegression {
    /// Goal id
    pub goal_id: GoalId,
    /// Phase the goal graduated into
    pub phase: Phase,
    /// Day it graduated
    pub graduated_on: NaiveDate,
    /// Threshold it dropped under
    pub threshold: f64,
    /// Progress now
    pub progress: f64,
}

/// First transition of `goal` under its template's graduation rule.
///
/// Snapshots of other goals are ignored; the rest are scanned in date order.
/// `min_days` of 0 is treated as 1.
#[must_use]
pub fn detect_phase_transition(
    goal: &GoalRecord,
    template: &GoalTemplate,
    snapshots: &[DailySnapshot],
    min_days: u32,
) -> Option<PhaseTransition> {
    let series: Vec<&DailySnapshot> = snapshots.iter().filter(|s| s.goal_id == goal.id).collect();
    scan(goal, template, series, min_days)
}

/// Transitions of every non-archived goal whose template has a rule.
///
/// Goals are scanned in parallel; output follows the order of `goals`.
#[must_use]
pub fn detect_all_phase_transitions(
    graph: &GoalGraph,
    goals: &[GoalRecord],
    snapshots: &[DailySnapshot],
    min_days: u32,
) -> Vec<PhaseTransition> {
    let mut by_goal: HashMap<&GoalId, Vec<&DailySnapshot>> = HashMap::new();
    for snap in snapshots {
        by_goal.entry(&snap.goal_id).or_default().push(snap);
    }

    let transitions: Vec<PhaseTransition> = goals
        .par_iter()
        .filter(|g| !g.archived)
        .filter_map(|goal| {
            let template = graph.template(&goal.template_id)?;
            let series = by_goal.get(&goal.id).cloned().unwrap_or_default();
            scan(goal, template, series, min_days)
        })
        .collect();
    tracing::debug!(
        goals = goals.len(),
        transitions = transitions.len(),
        "phase transitions detected"
    );
    transitions
}

/// Flag a goal whose progress dropped below the threshold it graduated on.
///
/// Never reverts the phase; the caller decides what to surface.
#[must_use]
pub fn check_graduation_regression(
    current_progress: f64,
    transition: &PhaseTransition,
    rule: &GraduationRule,
) -> Option<GraduationRegression> {
    if rule.to != transition.to_phase || current_progress >= rule.threshold {
        return None;
    }
    tracing::warn!(
        goal = %transition.goal_id,
        phase = ?transition.to_phase,
        progress = current_progress,
        threshold = rule.threshold,
        "graduated goal regressed below its threshold"
    );
    Some(GraduationRegression {
        goal_id: transition.goal_id.clone(),
        phase: transition.to_phase,
        graduated_on: transition.date,
        threshold: rule.threshold,
        progress: current_progress,
    })
}

fn scan(
    goal: &GoalRecord,
    template: &GoalTemplate,
    mut series: Vec<&DailySnapshot>,
    min_days: u32,
) -> Option<PhaseTransition> {
    let rule = template.graduation?;
    let target = goal.target_value.unwrap_or(template.target_value);
    let needed = min_days.max(1);
    series.sort_by_key(|s| s.date);

    let mut run = 0u32;
    let mut previous: Option<NaiveDate> = None;
    for (i, snap) in series.iter().enumerate() {
        // Same-day duplicates: only the last one counts
        if series.get(i + 1).is_some_and(|next| next.date == snap.date) {
            continue;
        }
        let qualifies = leaf_progress(snap.value, target) >= rule.threshold;
        let follows = previous.and_then(|p| p.succ_opt()) == Some(snap.date);
        run = match (qualifies, follows) {
            (false, _) => 0,
            (true, true) => run + 1,
            (true, false) => 1,
        };
        previous = Some(snap.date);
        if run == needed {
            return Some(PhaseTransition {
                goal_id: goal.id.clone(),
                from_phase: rule.from,
                to_phase: rule.to,
                date: snap.date,
            });
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Days, TimeZone, Utc};
    use stride_graph::{Cadence, GoalCategory, LifeArea};

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 2, day).unwrap()
    }

    fn template() -> GoalTemplate {
        GoalTemplate::new("t", GoalCategory::Habit, LifeArea::Social, 1.0)
            .with_cadence(Cadence::Daily)
            .with_graduation(GraduationRule {
                from: Phase::Foundation,
                to: Phase::Momentum,
                threshold: 50.0,
            })
    }

    fn goal() -> GoalRecord {
        GoalRecord::new("g", "t", Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap())
    }

    fn run(values: &[f64]) -> Vec<DailySnapshot> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| DailySnapshot::new("g", d(1).checked_add_days(Days::new(i as u64)).unwrap(), *v))
            .collect()
    }

    #[test]
    fn fires_on_the_kth_qualifying_day() {
        let snaps = run(&[10.0, 60.0, 60.0, 60.0]);
        let t = detect_phase_transition(&goal(), &template(), &snaps, 3).unwrap();
        assert_eq!(t.date, d(4));
        assert_eq!((t.from_phase, t.to_phase), (Phase::Foundation, Phase::Momentum));
    }

    #[test]
    fn single_day_spike_does_not_fire() {
        let snaps = run(&[60.0, 10.0, 60.0, 10.0]);
        assert_eq!(detect_phase_transition(&goal(), &template(), &snaps, 2), None);
    }

    #[test]
    fn gap_day_resets_the_run() {
        let snaps = vec![
            DailySnapshot::new("g", d(1), 60.0),
            DailySnapshot::new("g", d(3), 60.0),
            DailySnapshot::new("g", d(4), 60.0),
        ];
        let t = detect_phase_transition(&goal(), &template(), &snaps, 2).unwrap();
        assert_eq!(t.date, d(4));
    }

    #[test]
    fn unsorted_input_is_scanned_by_date() {
        let mut snaps = run(&[60.0, 60.0]);
        snaps.reverse();
        assert!(detect_phase_transition(&goal(), &template(), &snaps, 2).is_some());
    }

    #[test]
    fn regression_is_a_flag() {
        let t = PhaseTransition {
            goal_id: "g".into(),
            from_phase: Phase::Foundation,
            to_phase: Phase::Momentum,
            date: d(4),
        };
        let rule = template().graduation.unwrap();
        assert_eq!(check_graduation_regression(55.0, &t, &rule), None);
        let flag = check_graduation_regression(30.0, &t, &rule).unwrap();
        assert_eq!(flag.graduated_on, d(4));
        assert_eq!(flag.progress, 30.0);
    }
}
