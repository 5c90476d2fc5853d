//! Goal filtering and grouping
//!
//! [`FilterState`] names every supported dimension explicitly. Raw request
//! parameters are parsed with [`FilterState::from_params`], which drops keys
//! and values it does not recognize instead of failing.

use crate::tree::GoalWithProgress;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use stride_graph::{LifeArea, TimeHorizon};

/// How archived goals are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchivedFilter {
    /// Hide archived goals
    #[default]
    Exclude,
    /// Show archived and live goals
    Include,
    /// Show archived goals only
    Only,
}

/// Completion dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionFilter {
    /// No restriction
    #[default]
    Any,
    /// Completed goals only
    Completed,
    /// Goals still in progress
    Incomplete,
}

/// Every supported filter dimension. Empty sets mean "no restriction".
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterState {
    /// Allowed life areas
    pub life_areas: Vec<LifeArea>,
    /// Allowed horizons
    pub horizons: Vec<TimeHorizon>,
    /// Archived handling
    pub archived: ArchivedFilter,
    /// Completion handling
    pub completion: CompletionFilter,
}

impl FilterState {
    /// Parse raw key/value pairs.
    ///
    /// Recognized keys: `lifeArea`/`area`, `horizon`/`timeHorizon`, `archived`,
    /// `completed`/`completion`. Area and horizon values may be comma
    /// separated and repeated. Anything else is logged and ignored.
    #[must_use]
    pub fn from_params<'a>(params: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut state = Self::default();
        for (key, value) in params {
            match key {
                "lifeArea" | "life_area" | "area" => {
                    for raw in split_values(value) {
                        match raw.parse::<LifeArea>() {
                            Ok(area) => push_unique(&mut state.life_areas, area),
                            Err(err) => tracing::warn!(%err, "ignoring filter value"),
                        }
                    }
                }
                "horizon" | "timeHorizon" | "time_horizon" => {
                    for raw in split_values(value) {
                        match raw.parse::<TimeHorizon>() {
                            Ok(horizon) => push_unique(&mut state.horizons, horizon),
                            Err(err) => tracing::warn!(%err, "ignoring filter value"),
                        }
                    }
                }
                "archived" => match value.trim().to_ascii_lowercase().as_str() {
                    "exclude" | "false" | "no" => state.archived = ArchivedFilter::Exclude,
                    "include" | "all" => state.archived = ArchivedFilter::Include,
                    "only" | "true" | "yes" => state.archived = ArchivedFilter::Only,
                    other => tracing::warn!(value = other, "ignoring archived filter value"),
                },
                "completed" | "completion" => match value.trim().to_ascii_lowercase().as_str() {
                    "any" | "all" => state.completion = CompletionFilter::Any,
                    "completed" | "true" | "yes" => state.completion = CompletionFilter::Completed,
                    "incomplete" | "false" | "no" => {
                        state.completion = CompletionFilter::Incomplete;
                    }
                    other => tracing::warn!(value = other, "ignoring completion filter value"),
                },
                other => tracing::warn!(key = other, "ignoring unknown filter key"),
            }
        }
        state
    }

    /// Whether `goal` passes every dimension
    #[must_use]
    pub fn matches(&self, goal: &GoalWithProgress) -> bool {
        let area_ok = self.life_areas.is_empty() || self.life_areas.contains(&goal.life_area);
        let horizon_ok = self.horizons.is_empty() || self.horizons.contains(&goal.horizon);
        let archived_ok = match self.archived {
            ArchivedFilter::Exclude => !goal.archived,
            ArchivedFilter::Include => true,
            ArchivedFilter::Only => goal.archived,
        };
        let completion_ok = match self.completion {
            CompletionFilter::Any => true,
            CompletionFilter::Completed => goal.completed,
            CompletionFilter::Incomplete => !goal.completed,
        };
        area_ok && horizon_ok && archived_ok && completion_ok
    }
}

fn split_values(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|v| !v.is_empty())
}

fn push_unique<T: PartialEq>(items: &mut Vec<T>, item: T) {
    if !items.contains(&item) {
        items.push(item);
    }
}

/// Goals passing `filter`, input order preserved
#[must_use]
pub fn filter_goals<'a>(
    goals: impl IntoIterator<Item = &'a GoalWithProgress>,
    filter: &FilterState,
) -> Vec<&'a GoalWithProgress> {
    goals.into_iter().filter(|g| filter.matches(g)).collect()
}

/// Group by life area; groups in first-seen order, input order inside each
#[must_use]
pub fn group_goals_by_life_area<'a>(
    goals: impl IntoIterator<Item = &'a GoalWithProgress>,
) -> IndexMap<LifeArea, Vec<&'a GoalWithProgress>> {
    let mut groups: IndexMap<LifeArea, Vec<&GoalWithProgress>> = IndexMap::new();
    for goal in goals {
        groups.entry(goal.life_area).or_default().push(goal);
    }
    groups
}

/// Group by horizon; groups in first-seen order, input order inside each
#[must_use]
pub fn group_goals_by_time_horizon<'a>(
    goals: impl IntoIterator<Item = &'a GoalWithProgress>,
) -> IndexMap<TimeHorizon, Vec<&'a GoalWithProgress>> {
    let mut groups: IndexMap<TimeHorizon, Vec<&GoalWithProgress>> = IndexMap::new();
    for goal in goals {
        groups.entry(goal.horizon).or_default().push(goal);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use stride_graph::Cadence;

    fn goal(id: &str, area: LifeArea, horizon: TimeHorizon, progress: f64) -> GoalWithProgress {
        let at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        GoalWithProgress {
            id: id.into(),
            template_id: id.into(),
            parent_id: None,
            life_area: area,
            horizon,
            cadence: Cadence::Daily,
            target_date: None,
            target_value: 100.0,
            current_value: progress,
            progress,
            weight: 1.0,
            completed: progress >= 100.0,
            archived: false,
            frozen: false,
            created_at: at,
            last_updated_at: at,
            last_snapshot_date: None,
        }
    }

    fn sample() -> Vec<GoalWithProgress> {
        let mut archived = goal("d", LifeArea::Dating, TimeHorizon::Near, 10.0);
        archived.archived = true;
        vec![
            goal("a", LifeArea::Dating, TimeHorizon::Near, 100.0),
            goal("b", LifeArea::Fitness, TimeHorizon::Long, 20.0),
            goal("c", LifeArea::Dating, TimeHorizon::Mid, 50.0),
            archived,
        ]
    }

    fn ids(goals: &[&GoalWithProgress]) -> Vec<String> {
        goals.iter().map(|g| g.id.to_string()).collect()
    }

    #[test]
    fn unknown_keys_and_values_are_ignored() {
        let state = FilterState::from_params([
            ("lifeArea", "dating, astrology"),
            ("colour", "blue"),
            ("archived", "sometimes"),
        ]);
        assert_eq!(state.life_areas, vec![LifeArea::Dating]);
        assert_eq!(state.archived, ArchivedFilter::Exclude);
    }

    #[test]
    fn filters_combine() {
        let goals = sample();
        let state = FilterState::from_params([("area", "dating"), ("completed", "false")]);
        assert_eq!(ids(&filter_goals(&goals, &state)), vec!["c"]);

        let state = FilterState::from_params([("archived", "only")]);
        assert_eq!(ids(&filter_goals(&goals, &state)), vec!["d"]);

        let state = FilterState::from_params([("horizon", "near,long")]);
        assert_eq!(ids(&filter_goals(&goals, &state)), vec!["a", "b"]);
    }

    #[test]
    fn grouping_is_stable() {
        let goals = sample();
        let groups = group_goals_by_life_area(&goals);
        let keys: Vec<LifeArea> = groups.keys().copied().collect();
        assert_eq!(keys, vec![LifeArea::Dating, LifeArea::Fitness]);
        assert_eq!(ids(&groups[&LifeArea::Dating]), vec!["a", "c", "d"]);

        let horizons = group_goals_by_time_horizon(&goals);
        assert_eq!(ids(&horizons[&TimeHorizon::Near]), vec!["a", "d"]);
    }
}
