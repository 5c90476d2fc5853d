//! Tree generation
//!
//! Turns a template selection into insert records for the persistence layer.
//! Every missing ancestor of a selected template is created too, parents are
//! emitted before their children, and each new goal joins its sibling group
//! through the weight redistribution policy.

use crate::error::ValidationError;
use crate::preview::PreviewState;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use stride_graph::{
    GoalGraph, GoalId, LifeArea, TemplateId, TimeHorizon, WeightChange, WeightTable,
};

/// One goal row to insert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchGoalInsert {
    /// New goal id
    pub id: GoalId,
    /// Template adopted
    pub template_id: TemplateId,
    /// Parent goal, existing or inserted earlier in the batch
    pub parent_id: Option<GoalId>,
    /// Weight within the sibling group after the batch
    pub weight: f64,
    /// Template life area
    pub life_area: LifeArea,
    /// Template horizon class
    pub time_horizon: TimeHorizon,
}

/// Insert records for `selected` on top of the live goals of `preview`.
///
/// Selected templates that already have a live goal produce nothing. In each
/// sibling group the live members keep their effective weights (graph
/// defaults with the preview's overrides, renormalized among themselves).
/// New members then join one at a time in catalog order, each taking its
/// default share while the members already there scale into the remaining
/// capacity.
///
/// # Errors
/// [`ValidationError::UnknownTemplate`] for the first unknown id; nothing is
/// generated in that case
pub fn generate_goal_tree_inserts(
    graph: &GoalGraph,
    selected: &[TemplateId],
    preview: &PreviewState,
) -> Result<Vec<BatchGoalInsert>, ValidationError> {
    if let Some(unknown) = selected.iter().find(|id| !graph.contains(id)) {
        return Err(ValidationError::UnknownTemplate(unknown.clone()));
    }

    let mut present: HashMap<TemplateId, GoalId> = preview
        .live_goals()
        .map(|g| (g.template_id.clone(), g.id.clone()))
        .collect();
    let live: HashSet<TemplateId> = present.keys().cloned().collect();

    let mut pending: Vec<(GoalId, TemplateId, Option<GoalId>)> = Vec::new();
    let mut visited: HashSet<&TemplateId> = HashSet::new();
    for template in selected {
        if !visited.insert(template) {
            continue;
        }
        let mut chain = graph.ancestors(template);
        chain.reverse();
        chain.push(template.clone());

        let mut parent: Option<GoalId> = None;
        for link in chain {
            let id = match present.get(&link) {
                Some(existing) => existing.clone(),
                None => {
                    let id = GoalId::generate();
                    present.insert(link.clone(), id.clone());
                    pending.push((id.clone(), link, parent.clone()));
                    id
                }
            };
            parent = Some(id);
        }
    }

    let weights = graph.achievement_weights(&preview.weight_overrides);
    let fresh: HashSet<&TemplateId> = pending.iter().map(|(_, t, _)| t).collect();
    let mut table = WeightTable::new();
    let mut groups_done: HashSet<Option<&TemplateId>> = HashSet::new();
    for template in &fresh {
        if groups_done.insert(graph.parent(template)) {
            join_group(graph, &weights, &live, &fresh, template, &mut table);
        }
    }

    let inserts: Vec<BatchGoalInsert> = pending
        .iter()
        .filter_map(|(id, template_id, parent_id)| {
            let template = graph.template(template_id)?;
            Some(BatchGoalInsert {
                id: id.clone(),
                template_id: template_id.clone(),
                parent_id: parent_id.clone(),
                weight: table.weight_or(template_id, 0.0),
                life_area: template.life_area,
                time_horizon: template.horizon,
            })
        })
        .collect();

    tracing::info!(
        selected = selected.len(),
        inserts = inserts.len(),
        "goal tree inserts generated"
    );
    Ok(inserts)
}

/// Redistribute the sibling group of `member` as its new templates join
fn join_group(
    graph: &GoalGraph,
    weights: &WeightTable<TemplateId>,
    live: &HashSet<TemplateId>,
    fresh: &HashSet<&TemplateId>,
    member: &TemplateId,
    table: &mut WeightTable<TemplateId>,
) {
    let group = graph.sibling_group(member);
    let mut members: Vec<TemplateId> = group.iter().filter(|t| live.contains(*t)).cloned().collect();
    for existing in &members {
        table.insert(existing.clone(), weights.weight_or(existing, 0.0));
    }
    table.normalize_group(&members);
    for joining in group.iter().filter(|t| fresh.contains(t)) {
        table.apply_change(
            &members,
            WeightChange::Added {
                id: joining.clone(),
                weight: graph.template(joining).map(|t| t.default_weight),
            },
        );
        members.push(joining.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preview::build_preview_state;
    use chrono::{TimeZone, Utc};
    use stride_graph::{GoalCategory, GoalGraphEdge, GoalRecord, GoalTemplate};

    fn ids(list: &[&str]) -> Vec<TemplateId> {
        list.iter().map(|s| TemplateId::new(*s)).collect()
    }

    #[test]
    fn ancestors_come_first() {
        let graph = GoalGraph::builtin().unwrap();
        let inserts =
            generate_goal_tree_inserts(&graph, &ids(&["approach-volume"]), &PreviewState::default())
                .unwrap();
        let templates: Vec<&str> = inserts.iter().map(|i| i.template_id.as_str()).collect();
        assert_eq!(templates, vec!["dating", "dating-approaches", "approach-volume"]);
        assert_eq!(inserts[0].parent_id, None);
        assert_eq!(inserts[1].parent_id.as_ref(), Some(&inserts[0].id));
        assert_eq!(inserts[2].parent_id.as_ref(), Some(&inserts[1].id));
        // Alone in each group
        assert!(inserts.iter().all(|i| (i.weight - 1.0).abs() < 1e-9));
    }

    #[test]
    fn existing_goals_are_reused() {
        let graph = GoalGraph::builtin().unwrap();
        let at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let goals = vec![
            GoalRecord::new("g-social", "social", at),
            GoalRecord::new("g-events", "social-events", at).with_parent("g-social"),
        ];
        let preview = build_preview_state(&goals);
        let inserts =
            generate_goal_tree_inserts(&graph, &ids(&["social-conversations", "social-events"]), &preview)
                .unwrap();
        assert_eq!(inserts.len(), 1);
        assert_eq!(inserts[0].parent_id, Some(GoalId::new("g-social")));
        assert!((inserts[0].weight - 0.5).abs() < 1e-9);
    }

    #[test]
    fn partial_group_makes_room_for_the_new_sibling() {
        let graph = GoalGraph::load(
            vec![
                GoalTemplate::new("area", GoalCategory::Area, LifeArea::Fitness, 1.0),
                GoalTemplate::new("a", GoalCategory::Habit, LifeArea::Fitness, 0.5),
                GoalTemplate::new("b", GoalCategory::Habit, LifeArea::Fitness, 0.3),
                GoalTemplate::new("c", GoalCategory::Habit, LifeArea::Fitness, 0.2),
            ],
            vec![
                GoalGraphEdge::new("area", "a"),
                GoalGraphEdge::new("area", "b"),
                GoalGraphEdge::new("area", "c"),
            ],
        )
        .unwrap();
        let at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let goals = vec![
            GoalRecord::new("g-area", "area", at),
            GoalRecord::new("g-a", "a", at).with_parent("g-area"),
        ];
        let inserts =
            generate_goal_tree_inserts(&graph, &ids(&["c"]), &build_preview_state(&goals)).unwrap();
        assert_eq!(inserts.len(), 1);
        assert!((inserts[0].weight - 0.2).abs() < 1e-9);

        // Both missing siblings join in catalog order
        let inserts =
            generate_goal_tree_inserts(&graph, &ids(&["c", "b"]), &build_preview_state(&goals))
                .unwrap();
        let weight = |t: &str| inserts.iter().find(|i| i.template_id.as_str() == t).unwrap().weight;
        // a alone = 1; b joins at 0.3 (a 0.7); c joins at 0.2 (a 0.56, b 0.24)
        assert!((weight("b") - 0.24).abs() < 1e-9);
        assert!((weight("c") - 0.2).abs() < 1e-9);
    }

    #[test]
    fn unknown_selection_generates_nothing() {
        let graph = GoalGraph::builtin().unwrap();
        let err = generate_goal_tree_inserts(
            &graph,
            &ids(&["approach-volume", "telepathy"]),
            &PreviewState::default(),
        )
        .unwrap_err();
        assert_eq!(err, ValidationError::UnknownTemplate("telepathy".into()));
    }
}
