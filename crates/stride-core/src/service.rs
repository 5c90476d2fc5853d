//! Goals service
//!
//! Holds the immutable context every computation needs (goal graph, effective
//! weights, engine config, week calendar) and exposes the engine operations
//! over it. The service never mutates its inputs and is safe to share between
//! threads when the calendar is.

use crate::activity::{
    get_goal_staleness, goals_to_auto_freeze, group_snapshots_into_weeks, is_daily_actionable,
    should_auto_freeze,
};
use crate::bottleneck::{compute_bottleneck, Bottleneck};
use crate::calendar::{IsoWeekCalendar, WeekCalendar};
use crate::config::EngineConfig;
use crate::error::ValidationError;
use crate::horizon::derive_time_horizon;
use crate::pacing::{compute_pacing, compute_will_gate, PacingInfo, WillGateResult};
use crate::preview::{apply_preview_state, AppliedPreview, PreviewState};
use crate::transition::{
    check_graduation_regression, detect_all_phase_transitions, detect_phase_transition,
    GraduationRegression, PhaseTransition,
};
use crate::tree::{build_goal_tree, build_goal_tree_as_of, compute_life_area_progress, GoalTree};
use crate::tree_gen::{generate_goal_tree_inserts, BatchGoalInsert};
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeMap;
use stride_badge::{compute_all_badges, BadgeTier};
use stride_graph::{
    ConfigError, DailySnapshot, GoalGraph, GoalId, GoalRecord, LifeArea, TemplateId, TimeHorizon,
    WeightTable,
};
use stride_milestone::compute_achievement_progress;

/// Engine entry point for one goal graph and configuration
#[derive(Debug, Clone)]
pub struct GoalsService<'g, C = IsoWeekCalendar> {
    graph: &'g GoalGraph,
    weights: WeightTable<TemplateId>,
    config: EngineConfig,
    calendar: C,
}

impl<'g> GoalsService<'g> {
    /// Service over `graph` with the ISO week calendar
    ///
    /// # Errors
    /// [`ConfigError`] if `config` is out of range
    pub fn new(graph: &'g GoalGraph, config: EngineConfig) -> Result<Self, ConfigError> {
        Self::with_calendar(graph, config, IsoWeekCalendar)
    }
}

impl<'g, C: WeekCalendar> GoalsService<'g, C> {
    /// Service with a custom week calendar
    ///
    /// # Errors
    /// [`ConfigError`] if `config` is out of range
    pub fn with_calendar(
        graph: &'g GoalGraph,
        config: EngineConfig,
        calendar: C,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            graph,
            weights: graph.default_weights().clone(),
            config,
            calendar,
        })
    }

    /// Apply per-user weight overrides on top of the graph defaults
    #[must_use]
    pub fn with_weight_overrides(mut self, overrides: &BTreeMap<TemplateId, f64>) -> Self {
        self.weights = self.graph.achievement_weights(overrides);
        self
    }

    /// The goal graph
    #[inline]
    #[must_use]
    pub fn graph(&self) -> &'g GoalGraph {
        self.graph
    }

    /// Effective weight table
    #[inline]
    #[must_use]
    pub fn weights(&self) -> &WeightTable<TemplateId> {
        &self.weights
    }

    /// Engine configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Week calendar
    #[inline]
    #[must_use]
    pub fn calendar(&self) -> &C {
        &self.calendar
    }

    /// Goal tree over all snapshots
    #[must_use]
    pub fn build_goal_tree(&self, goals: &[GoalRecord], snapshots: &[DailySnapshot]) -> GoalTree {
        build_goal_tree(self.graph, &self.weights, goals, snapshots)
    }

    /// Goal tree as it stood at the end of `date`
    #[must_use]
    pub fn build_goal_tree_as_of(
        &self,
        goals: &[GoalRecord],
        snapshots: &[DailySnapshot],
        date: NaiveDate,
    ) -> GoalTree {
        build_goal_tree_as_of(self.graph, &self.weights, &self.config, goals, snapshots, date)
    }

    /// Single program-wide score in `[0, 100]` folded over the template graph
    #[must_use]
    pub fn compute_achievement_progress(
        &self,
        goals: &[GoalRecord],
        snapshots: &[DailySnapshot],
    ) -> f64 {
        compute_achievement_progress(self.graph, &self.weights, goals, snapshots)
    }

    /// Progress per life area
    #[must_use]
    pub fn compute_life_area_progress(&self, tree: &GoalTree) -> BTreeMap<LifeArea, f64> {
        compute_life_area_progress(tree)
    }

    /// Horizon of `goal` on `today`; templates unknown to the graph fall back to mid
    #[must_use]
    pub fn derive_time_horizon(&self, goal: &GoalRecord, today: NaiveDate) -> TimeHorizon {
        let fallback = self
            .graph
            .template(&goal.template_id)
            .map_or(TimeHorizon::Mid, |t| t.horizon);
        derive_time_horizon(goal.target_date, fallback, today, &self.config)
    }

    /// Pace of `goal` on `today`
    #[must_use]
    pub fn compute_pacing(
        &self,
        goal: &GoalRecord,
        snapshots: &[DailySnapshot],
        today: NaiveDate,
    ) -> PacingInfo {
        compute_pacing(goal, self.target_value(goal), snapshots, today)
    }

    /// Will gate with the configured tolerance
    #[must_use]
    pub fn compute_will_gate(&self, goal: &GoalRecord, pacing: &PacingInfo) -> WillGateResult {
        compute_will_gate(goal, pacing, self.config.will_gate_tolerance)
    }

    /// Tree-wide bottleneck
    #[must_use]
    pub fn compute_bottleneck(&self, tree: &GoalTree) -> Option<Bottleneck> {
        compute_bottleneck(tree)
    }

    /// First graduation of `goal`, if its template has a rule
    #[must_use]
    pub fn detect_phase_transition(
        &self,
        goal: &GoalRecord,
        snapshots: &[DailySnapshot],
    ) -> Option<PhaseTransition> {
        let template = self.graph.template(&goal.template_id)?;
        detect_phase_transition(
            goal,
            template,
            snapshots,
            self.config.transition_min_consecutive_days,
        )
    }

    /// Graduations of every non-archived goal
    #[must_use]
    pub fn detect_all_phase_transitions(
        &self,
        goals: &[GoalRecord],
        snapshots: &[DailySnapshot],
    ) -> Vec<PhaseTransition> {
        detect_all_phase_transitions(
            self.graph,
            goals,
            snapshots,
            self.config.transition_min_consecutive_days,
        )
    }

    /// Regression flag for a past graduation of `goal`
    #[must_use]
    pub fn check_graduation_regression(
        &self,
        goal: &GoalRecord,
        current_progress: f64,
        transition: &PhaseTransition,
    ) -> Option<GraduationRegression> {
        let rule = self.graph.template(&goal.template_id)?.graduation?;
        check_graduation_regression(current_progress, transition, &rule)
    }

    /// Whether `goal` expects an action on `date`
    #[must_use]
    pub fn is_daily_actionable(&self, goal: &GoalRecord, date: NaiveDate) -> bool {
        self.graph
            .template(&goal.template_id)
            .is_some_and(|t| is_daily_actionable(goal, t.cadence, date))
    }

    /// Snapshots bucketed by ISO week
    #[must_use]
    pub fn group_snapshots_into_weeks<'s>(
        &self,
        snapshots: &'s [DailySnapshot],
    ) -> BTreeMap<String, Vec<&'s DailySnapshot>> {
        group_snapshots_into_weeks(&self.calendar, snapshots)
    }

    /// Whether `goal_id` in `tree` should be auto-frozen on `now`, given its
    /// last update
    #[must_use]
    pub fn should_auto_freeze(
        &self,
        tree: &GoalTree,
        goal_id: &GoalId,
        last_update: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> bool {
        tree.find(goal_id).is_some_and(|node| {
            should_auto_freeze(
                &node.goal,
                last_update.date_naive(),
                now.date_naive(),
                self.config.staleness_threshold_days,
            )
        })
    }

    /// Goals in `tree` due for auto-freeze on `now`
    #[must_use]
    pub fn goals_to_auto_freeze(&self, tree: &GoalTree, now: NaiveDate) -> Vec<GoalId> {
        goals_to_auto_freeze(tree, now, self.config.staleness_threshold_days)
    }

    /// Days since the last snapshot of `goal`
    #[must_use]
    pub fn get_goal_staleness(
        &self,
        goal: &GoalRecord,
        snapshots: &[DailySnapshot],
        now: NaiveDate,
    ) -> Option<i64> {
        get_goal_staleness(&goal.id, snapshots, now)
    }

    /// Badge per goal in `tree` with the configured tiers
    #[must_use]
    pub fn compute_all_badges(&self, tree: &GoalTree) -> BTreeMap<GoalId, BadgeTier> {
        compute_all_badges(&tree.flatten(), &self.config.badge_tiers)
    }

    /// Insert records for an onboarding selection
    ///
    /// # Errors
    /// [`ValidationError::UnknownTemplate`] for ids not in the graph
    pub fn generate_goal_tree_inserts(
        &self,
        selected: &[TemplateId],
        preview: &PreviewState,
    ) -> Result<Vec<BatchGoalInsert>, ValidationError> {
        generate_goal_tree_inserts(self.graph, selected, preview)
    }

    /// Merge an onboarding preview into the committed goals
    ///
    /// # Errors
    /// See [`apply_preview_state`]
    pub fn apply_preview_state(
        &self,
        goals: &[GoalRecord],
        preview: &PreviewState,
        now: DateTime<Utc>,
    ) -> Result<AppliedPreview, ValidationError> {
        apply_preview_state(self.graph, goals, preview, now)
    }

    pub(crate) fn target_value(&self, goal: &GoalRecord) -> f64 {
        goal.target_value
            .or_else(|| self.graph.template(&goal.template_id).map(|t| t.target_value))
            .unwrap_or_default()
    }
}
