//! Weighted achievement score
//!
//! Folds leaf progress bottom-up through the template graph. Templates the
//! user has not adopted, and adopted leaves without snapshots, count as 0.

use std::collections::HashMap;
use stride_graph::{DailySnapshot, GoalGraph, GoalId, GoalRecord, TemplateId, WeightTable};

/// Percentage of `target` reached by `value`, clamped to `[0, 100]`.
///
/// A non-positive target counts as met once any value is recorded.
#[must_use]
pub fn leaf_progress(value: f64, target: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    if !target.is_finite() || target <= 0.0 {
        return if value > 0.0 { 100.0 } else { 0.0 };
    }
    (value / target * 100.0).clamp(0.0, 100.0)
}

/// Latest snapshot per goal (greatest date; later entries win ties)
#[must_use]
pub fn latest_snapshots(snapshots: &[DailySnapshot]) -> HashMap<&GoalId, &DailySnapshot> {
    let mut latest: HashMap<&GoalId, &DailySnapshot> = HashMap::new();
    for snap in snapshots {
        latest
            .entry(&snap.goal_id)
            .and_modify(|current| {
                if snap.date >= current.date {
                    *current = snap;
                }
            })
            .or_insert(snap);
    }
    latest
}

/// Single `[0, 100]` score for the whole program.
///
/// Each leaf template takes the progress of the user's (non-archived) goal
/// adopted from it, measured from that goal's latest snapshot. Parents are the
/// weighted sum of their children; the roots are combined by root weight.
#[must_use]
pub fn compute_achievement_progress(
    graph: &GoalGraph,
    weights: &WeightTable<TemplateId>,
    goals: &[GoalRecord],
    snapshots: &[DailySnapshot],
) -> f64 {
    let latest = latest_snapshots(snapshots);
    let mut by_template: HashMap<&TemplateId, &GoalRecord> = HashMap::new();
    for goal in goals.iter().filter(|g| !g.archived) {
        by_template.entry(&goal.template_id).or_insert(goal);
    }

    let leaf = |id: &TemplateId| -> f64 {
        let Some(goal) = by_template.get(id) else {
            return 0.0;
        };
        let Some(snap) = latest.get(&goal.id) else {
            return 0.0;
        };
        let target = goal
            .target_value
            .or_else(|| graph.template(id).map(|t| t.target_value))
            .unwrap_or_default();
        leaf_progress(snap.value, target)
    };

    fn fold(
        id: &TemplateId,
        graph: &GoalGraph,
        weights: &WeightTable<TemplateId>,
        leaf: &dyn Fn(&TemplateId) -> f64,
    ) -> f64 {
        let children = graph.children(id);
        if children.is_empty() {
            return leaf(id);
        }
        weighted_mean(children, weights, |c| fold(c, graph, weights, leaf))
    }

    let score = weighted_mean(graph.roots(), weights, |r| fold(r, graph, weights, &leaf));
    tracing::debug!(score, goals = goals.len(), "achievement progress computed");
    score.clamp(0.0, 100.0)
}

fn weighted_mean(
    ids: &[TemplateId],
    weights: &WeightTable<TemplateId>,
    mut progress: impl FnMut(&TemplateId) -> f64,
) -> f64 {
    let total = weights.sum_of(ids);
    if total <= f64::EPSILON {
        return 0.0;
    }
    ids.iter()
        .map(|id| weights.weight_or(id, 0.0) * progress(id))
        .sum::<f64>()
        / total
}
