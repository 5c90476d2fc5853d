//! Weekly review aggregation
//!
//! One payload per ISO week: progress deltas, completions, activity streaks,
//! the current bottleneck, badge movements and graduation events.

use crate::activity::streak_ending;
use crate::bottleneck::{compute_bottleneck, Bottleneck};
use crate::calendar::WeekCalendar;
use crate::service::GoalsService;
use crate::transition::{check_graduation_regression, GraduationRegression, PhaseTransition};
use crate::tree::{compute_life_area_progress, GoalWithProgress};
use chrono::{Days, NaiveDate};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use stride_badge::{badge_changes, compute_all_badges, BadgeChange};
use stride_graph::{DailySnapshot, GoalId, GoalRecord, LifeArea, TemplateId};

/// Progress movement of one goal over the week
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalDelta {
    /// Goal id
    pub goal_id: GoalId,
    /// Template id
    pub template_id: TemplateId,
    /// Progress at the end of the previous week
    pub start_progress: f64,
    /// Progress at the end of this week
    pub end_progress: f64,
    /// `end_progress − start_progress`
    pub delta: f64,
}

/// Review payload for one week
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyReviewData {
    /// `YYYY-Www`
    pub week: String,
    /// Monday of the week
    pub period_start: NaiveDate,
    /// Sunday of the week
    pub period_end: NaiveDate,
    /// Per-goal deltas, ordered by goal id
    pub goal_deltas: Vec<GoalDelta>,
    /// Goals that reached 100% during the week
    pub completed_this_week: usize,
    /// Goals at 100% at the end of the week
    pub completed_total: usize,
    /// Days of the week with at least one snapshot
    pub active_days: usize,
    /// Consecutive active days ending on the latest active day of the week
    pub day_streak: u32,
    /// Consecutive active weeks ending with this one
    pub week_streak: u32,
    /// Day streak per goal
    pub goal_streaks: BTreeMap<GoalId, u32>,
    /// Progress per life area at the end of the week
    pub life_area_progress: BTreeMap<LifeArea, f64>,
    /// Tree-wide bottleneck at the end of the week
    pub bottleneck: Option<Bottleneck>,
    /// Badge tiers that changed during the week
    pub badge_changes: Vec<BadgeChange<GoalId>>,
    /// Graduations that fired during the week
    pub transitions: Vec<PhaseTransition>,
    /// Graduated goals now below their threshold
    pub regressions: Vec<GraduationRegression>,
}

impl<C: WeekCalendar> GoalsService<'_, C> {
    /// Build the review for the ISO week containing `week_of`.
    ///
    /// Archived goals and snapshots after the week are ignored.
    #[must_use]
    pub fn compute_weekly_review_data(
        &self,
        goals: &[GoalRecord],
        snapshots: &[DailySnapshot],
        week_of: NaiveDate,
    ) -> WeeklyReviewData {
        let calendar = self.calendar();
        let (start, end) = calendar.week_bounds(week_of);
        let week = calendar.iso_week_string(week_of);

        let live: HashSet<&GoalId> = goals.iter().filter(|g| !g.archived).map(|g| &g.id).collect();
        let visible: Vec<DailySnapshot> = snapshots
            .iter()
            .filter(|s| s.date <= end && live.contains(&s.goal_id))
            .cloned()
            .collect();

        let before = self.build_goal_tree_as_of(goals, &visible, start.pred_opt().unwrap_or(start));
        let after = self.build_goal_tree_as_of(goals, &visible, end);
        let before_goals: Vec<GoalWithProgress> =
            before.flatten().into_iter().filter(|g| !g.archived).collect();
        let mut after_goals: Vec<GoalWithProgress> =
            after.flatten().into_iter().filter(|g| !g.archived).collect();
        after_goals.sort_by(|a, b| a.id.cmp(&b.id));
        let before_by_id: HashMap<&GoalId, &GoalWithProgress> =
            before_goals.iter().map(|g| (&g.id, g)).collect();

        let goal_deltas: Vec<GoalDelta> = after_goals
            .iter()
            .map(|g| {
                let start_progress = before_by_id.get(&g.id).map_or(0.0, |b| b.progress);
                GoalDelta {
                    goal_id: g.id.clone(),
                    template_id: g.template_id.clone(),
                    start_progress,
                    end_progress: g.progress,
                    delta: g.progress - start_progress,
                }
            })
            .collect();
        let completed_total = after_goals.iter().filter(|g| g.completed).count();
        let completed_this_week = after_goals
            .iter()
            .filter(|g| g.completed && !before_by_id.get(&g.id).is_some_and(|b| b.completed))
            .count();

        let active_dates: Vec<NaiveDate> = visible.iter().map(|s| s.date).collect();
        let active_days = active_dates
            .iter()
            .filter(|d| (start..=end).contains(*d))
            .collect::<BTreeSet<_>>()
            .len();
        let day_streak = streak_ending(&active_dates, start, end);
        let week_streak = self.week_streak(&week, start, &visible);

        let mut per_goal: HashMap<&GoalId, Vec<NaiveDate>> = HashMap::new();
        for snap in &visible {
            per_goal.entry(&snap.goal_id).or_default().push(snap.date);
        }
        let goal_streaks: BTreeMap<GoalId, u32> = after_goals
            .iter()
            .map(|g| {
                let days = per_goal.get(&g.id).map_or(&[][..], Vec::as_slice);
                (g.id.clone(), streak_ending(days, start, end))
            })
            .collect();

        let tiers = &self.config().badge_tiers;
        let badge_changes = badge_changes(
            &compute_all_badges(&before_goals, tiers),
            &compute_all_badges(&after_goals, tiers),
            tiers,
        );

        let all_transitions = self.detect_all_phase_transitions(goals, &visible);
        let by_id: HashMap<&GoalId, &GoalRecord> = goals.iter().map(|g| (&g.id, g)).collect();
        let after_by_id: HashMap<&GoalId, &GoalWithProgress> =
            after_goals.iter().map(|g| (&g.id, g)).collect();
        let regressions: Vec<GraduationRegression> = all_transitions
            .iter()
            .filter_map(|t| {
                let goal = by_id.get(&t.goal_id)?;
                let progress = after_by_id.get(&t.goal_id)?.progress;
                let rule = self.graph().template(&goal.template_id)?.graduation?;
                check_graduation_regression(progress, t, &rule)
            })
            .collect();
        let transitions: Vec<PhaseTransition> = all_transitions
            .into_iter()
            .filter(|t| (start..=end).contains(&t.date))
            .collect();

        tracing::debug!(
            %week,
            goals = after_goals.len(),
            active_days,
            day_streak,
            week_streak,
            "weekly review computed"
        );

        WeeklyReviewData {
            week,
            period_start: start,
            period_end: end,
            goal_deltas,
            completed_this_week,
            completed_total,
            active_days,
            day_streak,
            week_streak,
            goal_streaks,
            life_area_progress: compute_life_area_progress(&after),
            bottleneck: compute_bottleneck(&after),
            badge_changes,
            transitions,
            regressions,
        }
    }

    /// Active weeks in a row, walking back from `week`
    fn week_streak(&self, week: &str, monday: NaiveDate, snapshots: &[DailySnapshot]) -> u32 {
        let calendar = self.calendar();
        let mut streak = 0;
        let mut current = week.to_string();
        let mut cursor = monday;
        while calendar.is_week_active(&current, snapshots) {
            streak += 1;
            let Some(previous_day) = cursor.checked_sub_days(Days::new(7)) else {
                break;
            };
            let previous = calendar.iso_week_string(previous_day);
            if !calendar.are_weeks_consecutive(&previous, &current) {
                break;
            }
            cursor = previous_day;
            current = previous;
        }
        streak
    }
}

#[cfg(test)]
mod tests {
    use crate::config::EngineConfig;
    use crate::service::GoalsService;
    use chrono::NaiveDate;
    use stride_graph::DailySnapshot;
    use stride_test_utils::{day, goal_id, leaf_template, snapshot_run, three_area_goals, three_area_graph};

    #[test]
    fn quiet_week_has_no_streaks() {
        let graph = three_area_graph();
        let service = GoalsService::new(&graph, EngineConfig::default()).unwrap();
        let review = service.compute_weekly_review_data(&three_area_goals(), &[], day(2025, 1, 8));
        assert_eq!(review.week, "2025-W02");
        assert_eq!(review.active_days, 0);
        assert_eq!(review.day_streak, 0);
        assert_eq!(review.week_streak, 0);
        assert_eq!(review.completed_total, 0);
    }

    #[test]
    fn week_streak_spans_weeks() {
        let graph = three_area_graph();
        let service = GoalsService::new(&graph, EngineConfig::default()).unwrap();
        let goal = goal_id(&leaf_template(stride_graph::LifeArea::Social, false));
        // One log in each of W01, W02 and W03 of 2025
        let snaps: Vec<DailySnapshot> = [day(2024, 12, 31), day(2025, 1, 9), day(2025, 1, 15)]
            .into_iter()
            .enumerate()
            .map(|(i, d): (usize, NaiveDate)| DailySnapshot::new(goal.as_str(), d, i as f64 + 1.0))
            .collect();
        let review = service.compute_weekly_review_data(&three_area_goals(), &snaps, day(2025, 1, 15));
        assert_eq!(review.week_streak, 3);
        assert_eq!(review.day_streak, 1);

        let gap = service.compute_weekly_review_data(
            &three_area_goals(),
            &snapshot_run(&goal, day(2025, 1, 13), &[1.0]),
            day(2025, 1, 15),
        );
        assert_eq!(gap.week_streak, 1);
    }
}
