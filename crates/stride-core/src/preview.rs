//! Onboarding preview state
//!
//! An in-memory overlay of staged additions, removals and reweights on top of
//! the committed goal set. Nothing persisted changes until
//! [`apply_preview_state`] merges the whole overlay, and that merge either
//! succeeds completely or is rejected.

use crate::error::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use stride_graph::{GoalGraph, GoalId, GoalRecord, TemplateId, WeightChange, WeightTable};

/// Goal as seen by the preview
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StagedGoal {
    /// Goal id
    pub id: GoalId,
    /// Template id
    pub template_id: TemplateId,
    /// Parent goal
    pub parent_id: Option<GoalId>,
}

impl From<&GoalRecord> for StagedGoal {
    fn from(goal: &GoalRecord) -> Self {
        Self {
            id: goal.id.clone(),
            template_id: goal.template_id.clone(),
            parent_id: goal.parent_id.clone(),
        }
    }
}

/// Uncommitted edits over the committed goal set
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewState {
    /// Live goals when the preview was built
    pub committed: BTreeMap<GoalId, StagedGoal>,
    /// Goals staged for creation, in staging order
    pub added: Vec<StagedGoal>,
    /// Committed goals staged for archiving
    pub removed: BTreeSet<GoalId>,
    /// Weight overrides by template; staging additions and removals
    /// redistribute the affected sibling group here
    pub weight_overrides: BTreeMap<TemplateId, f64>,
}

/// Start a preview over the non-archived goals in `goals`
#[must_use]
pub fn build_preview_state(goals: &[GoalRecord]) -> PreviewState {
    PreviewState {
        committed: goals
            .iter()
            .filter(|g| !g.archived)
            .map(|g| (g.id.clone(), StagedGoal::from(g)))
            .collect(),
        ..PreviewState::default()
    }
}

impl PreviewState {
    /// Goals that would exist after applying: committed minus removed, plus added
    pub fn live_goals(&self) -> impl Iterator<Item = &StagedGoal> + '_ {
        self.committed
            .values()
            .filter(|g| !self.removed.contains(&g.id))
            .chain(self.added.iter())
    }

    /// Live goal adopted from `template`
    #[must_use]
    pub fn goal_for_template(&self, template: &TemplateId) -> Option<&StagedGoal> {
        self.live_goals().find(|g| &g.template_id == template)
    }

    /// Live goal with id `id`
    #[must_use]
    pub fn live_goal(&self, id: &GoalId) -> Option<&StagedGoal> {
        self.live_goals().find(|g| &g.id == id)
    }

    /// Whether the preview holds no edits
    #[must_use]
    pub fn is_unchanged(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.weight_overrides.is_empty()
    }

    /// Live templates of the sibling group of `template`, in catalog order
    fn live_siblings(&self, graph: &GoalGraph, template: &TemplateId) -> Vec<TemplateId> {
        graph
            .sibling_group(template)
            .iter()
            .filter(|t| self.goal_for_template(t).is_some())
            .cloned()
            .collect()
    }

    /// Apply `change` to the effective weights of `group` and record the result
    fn redistribute(
        &mut self,
        graph: &GoalGraph,
        group: &[TemplateId],
        change: WeightChange<TemplateId>,
    ) {
        let mut table: WeightTable<TemplateId> = group
            .iter()
            .map(|t| {
                let default = graph.template(t).map_or(0.0, |tpl| tpl.default_weight);
                (t.clone(), self.weight_overrides.get(t).copied().unwrap_or(default))
            })
            .collect();
        table.normalize_group(group);
        table.apply_change(group, change);
        for (template, weight) in table.iter() {
            self.weight_overrides.insert(template.clone(), weight);
        }
    }

    /// Stage a new goal for `template` and return its id.
    ///
    /// Without an explicit parent the goal is attached to the live goal of the
    /// template's graph parent, if there is one. The template joins its live
    /// siblings at its default weight and they scale into the rest.
    ///
    /// # Errors
    /// Unknown template, a live goal for the template already exists, or the
    /// parent is not live
    pub fn add_goal(
        &mut self,
        graph: &GoalGraph,
        template: &TemplateId,
        parent: Option<GoalId>,
    ) -> Result<GoalId, ValidationError> {
        if !graph.contains(template) {
            return Err(ValidationError::UnknownTemplate(template.clone()));
        }
        if self.goal_for_template(template).is_some() {
            return Err(ValidationError::DuplicateTemplate(template.clone()));
        }
        let parent_id = match parent {
            Some(parent) => {
                if self.live_goal(&parent).is_none() {
                    return Err(ValidationError::UnknownGoal(parent));
                }
                Some(parent)
            }
            None => graph
                .parent(template)
                .and_then(|p| self.goal_for_template(p))
                .map(|g| g.id.clone()),
        };
        let group = self.live_siblings(graph, template);
        let weight = graph.template(template).map(|t| t.default_weight);
        self.redistribute(
            graph,
            &group,
            WeightChange::Added {
                id: template.clone(),
                weight,
            },
        );
        let id = GoalId::generate();
        self.added.push(StagedGoal {
            id: id.clone(),
            template_id: template.clone(),
            parent_id,
        });
        Ok(id)
    }

    /// Stage removal of a live goal. Staged additions are simply dropped.
    /// The remaining live siblings are renormalized.
    ///
    /// # Errors
    /// Unknown goal, or the goal still has live children
    pub fn remove_goal(&mut self, graph: &GoalGraph, id: &GoalId) -> Result<(), ValidationError> {
        let template = self
            .live_goal(id)
            .map(|g| g.template_id.clone())
            .ok_or_else(|| ValidationError::UnknownGoal(id.clone()))?;
        if self.live_goals().any(|g| g.parent_id.as_ref() == Some(id)) {
            return Err(ValidationError::HasChildren(id.clone()));
        }
        let group = self.live_siblings(graph, &template);
        self.weight_overrides.remove(&template);
        self.redistribute(graph, &group, WeightChange::Removed { id: template });
        if let Some(pos) = self.added.iter().position(|g| &g.id == id) {
            self.added.remove(pos);
        } else {
            self.removed.insert(id.clone());
        }
        Ok(())
    }

    /// Override the weight of a live goal's template
    ///
    /// # Errors
    /// Unknown goal, or a weight that is not finite or outside `[0, 1]`
    pub fn reweight_goal(&mut self, id: &GoalId, weight: f64) -> Result<(), ValidationError> {
        if !weight.is_finite() || !(0.0..=1.0).contains(&weight) {
            return Err(ValidationError::WeightOutOfRange {
                id: id.clone(),
                weight,
            });
        }
        let template = self
            .live_goal(id)
            .map(|g| g.template_id.clone())
            .ok_or_else(|| ValidationError::UnknownGoal(id.clone()))?;
        self.weight_overrides.insert(template, weight);
        Ok(())
    }
}

/// Outcome of a successful merge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedPreview {
    /// Final goal list: existing rows in input order, then new rows
    pub goals: Vec<GoalRecord>,
    /// Ids of the rows created
    pub inserted: Vec<GoalId>,
    /// Ids of the rows archived
    pub archived: Vec<GoalId>,
    /// Weight overrides to persist
    pub weight_overrides: BTreeMap<TemplateId, f64>,
}

/// Merge `preview` into `goals`.
///
/// Removed goals are archived, never dropped. Everything is validated before
/// the first row is touched.
///
/// # Errors
/// [`ValidationError`] if the committed set moved on since the preview was
/// built, or if the overlay references unknown templates or goals, removes a
/// goal that keeps live children, duplicates a template or carries an
/// out-of-range weight
pub fn apply_preview_state(
    graph: &GoalGraph,
    goals: &[GoalRecord],
    preview: &PreviewState,
    now: DateTime<Utc>,
) -> Result<AppliedPreview, ValidationError> {
    let live_rows: HashSet<&GoalId> = goals.iter().filter(|g| !g.archived).map(|g| &g.id).collect();
    for id in preview.committed.keys() {
        if !live_rows.contains(id) {
            return Err(ValidationError::StalePreview(id.clone()));
        }
    }
    for id in &preview.removed {
        if !preview.committed.contains_key(id) {
            return Err(ValidationError::UnknownGoal(id.clone()));
        }
        if preview.live_goals().any(|g| g.parent_id.as_ref() == Some(id)) {
            return Err(ValidationError::HasChildren(id.clone()));
        }
    }

    let mut seen_templates = HashSet::new();
    for goal in preview.live_goals() {
        if !graph.contains(&goal.template_id) {
            return Err(ValidationError::UnknownTemplate(goal.template_id.clone()));
        }
        if !seen_templates.insert(&goal.template_id) {
            return Err(ValidationError::DuplicateTemplate(goal.template_id.clone()));
        }
    }
    for staged in &preview.added {
        if let Some(parent) = &staged.parent_id {
            if preview.live_goal(parent).is_none() {
                return Err(ValidationError::UnknownGoal(parent.clone()));
            }
        }
    }
    for (template, weight) in &preview.weight_overrides {
        let Some(goal) = preview.goal_for_template(template) else {
            return Err(ValidationError::UnknownTemplate(template.clone()));
        };
        if !weight.is_finite() || !(0.0..=1.0).contains(weight) {
            return Err(ValidationError::WeightOutOfRange {
                id: goal.id.clone(),
                weight: *weight,
            });
        }
    }

    let mut merged: Vec<GoalRecord> = goals.to_vec();
    let mut archived = Vec::new();
    for goal in &mut merged {
        if preview.removed.contains(&goal.id) {
            goal.archived = true;
            goal.last_updated_at = now;
            archived.push(goal.id.clone());
        }
    }
    let mut inserted = Vec::with_capacity(preview.added.len());
    for staged in &preview.added {
        let mut record = GoalRecord::new(staged.id.as_str(), staged.template_id.as_str(), now);
        record.parent_id.clone_from(&staged.parent_id);
        merged.push(record);
        inserted.push(staged.id.clone());
    }

    tracing::info!(
        inserted = inserted.len(),
        archived = archived.len(),
        overrides = preview.weight_overrides.len(),
        "preview applied"
    );
    Ok(AppliedPreview {
        goals: merged,
        inserted,
        archived,
        weight_overrides: preview.weight_overrides.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use stride_graph::{GoalCategory, GoalGraphEdge, GoalTemplate, LifeArea};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 2, 0, 0, 0).unwrap()
    }

    fn graph() -> GoalGraph {
        GoalGraph::load(
            vec![
                GoalTemplate::new("social", GoalCategory::Area, LifeArea::Social, 1.0),
                GoalTemplate::new("events", GoalCategory::Habit, LifeArea::Social, 0.5),
                GoalTemplate::new("chats", GoalCategory::Habit, LifeArea::Social, 0.5),
            ],
            vec![
                GoalGraphEdge::new("social", "events"),
                GoalGraphEdge::new("social", "chats"),
            ],
        )
        .unwrap()
    }

    fn committed() -> Vec<GoalRecord> {
        let at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        vec![
            GoalRecord::new("root", "social", at),
            GoalRecord::new("ev", "events", at).with_parent("root"),
        ]
    }

    #[test]
    fn staged_goals_attach_to_their_graph_parent() {
        let graph = graph();
        let mut preview = build_preview_state(&committed());
        let id = preview.add_goal(&graph, &"chats".into(), None).unwrap();
        assert_eq!(
            preview.live_goal(&id).unwrap().parent_id,
            Some(GoalId::new("root"))
        );
        assert_eq!(
            preview.add_goal(&graph, &"chats".into(), None),
            Err(ValidationError::DuplicateTemplate("chats".into()))
        );
        assert_eq!(
            preview.add_goal(&graph, &"ghost".into(), None),
            Err(ValidationError::UnknownTemplate("ghost".into()))
        );
    }

    #[test]
    fn removing_a_parent_with_children_is_rejected() {
        let graph = graph();
        let mut preview = build_preview_state(&committed());
        assert_eq!(
            preview.remove_goal(&graph, &"root".into()),
            Err(ValidationError::HasChildren("root".into()))
        );
        preview.remove_goal(&graph, &"ev".into()).unwrap();
        preview.remove_goal(&graph, &"root".into()).unwrap();
        assert_eq!(preview.live_goals().count(), 0);
    }

    #[test]
    fn apply_archives_and_appends() {
        let graph = graph();
        let goals = committed();
        let mut preview = build_preview_state(&goals);
        preview.remove_goal(&graph, &"ev".into()).unwrap();
        let chats = preview.add_goal(&graph, &"chats".into(), None).unwrap();
        preview.reweight_goal(&chats, 0.8).unwrap();

        let applied = apply_preview_state(&graph, &goals, &preview, now()).unwrap();
        assert_eq!(applied.goals.len(), 3);
        assert!(applied.goals[1].archived);
        assert_eq!(applied.goals[1].last_updated_at, now());
        assert_eq!(applied.goals[2].id, chats);
        assert_eq!(applied.inserted, vec![chats]);
        assert_eq!(applied.weight_overrides.get(&TemplateId::new("chats")), Some(&0.8));
    }

    #[test]
    fn hand_built_removal_of_a_parent_is_rejected_on_apply() {
        let graph = graph();
        let goals = committed();
        let mut preview = build_preview_state(&goals);
        preview.removed.insert("root".into());
        assert_eq!(
            apply_preview_state(&graph, &goals, &preview, now()),
            Err(ValidationError::HasChildren("root".into()))
        );
    }

    #[test]
    fn staging_redistributes_the_sibling_group() {
        let graph = GoalGraph::load(
            vec![
                GoalTemplate::new("fit", GoalCategory::Area, LifeArea::Fitness, 1.0),
                GoalTemplate::new("a", GoalCategory::Habit, LifeArea::Fitness, 0.5),
                GoalTemplate::new("b", GoalCategory::Habit, LifeArea::Fitness, 0.3),
                GoalTemplate::new("c", GoalCategory::Habit, LifeArea::Fitness, 0.2),
            ],
            vec![
                GoalGraphEdge::new("fit", "a"),
                GoalGraphEdge::new("fit", "b"),
                GoalGraphEdge::new("fit", "c"),
            ],
        )
        .unwrap();
        let at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let goals = vec![
            GoalRecord::new("g-fit", "fit", at),
            GoalRecord::new("g-a", "a", at).with_parent("g-fit"),
        ];
        let mut preview = build_preview_state(&goals);
        let c = preview.add_goal(&graph, &"c".into(), None).unwrap();
        let weight = |p: &PreviewState, t: &str| p.weight_overrides[&TemplateId::new(t)];
        assert!((weight(&preview, "a") - 0.8).abs() < 1e-9);
        assert!((weight(&preview, "c") - 0.2).abs() < 1e-9);

        preview.remove_goal(&graph, &"g-a".into()).unwrap();
        assert!(!preview.weight_overrides.contains_key(&TemplateId::new("a")));
        assert!((weight(&preview, "c") - 1.0).abs() < 1e-9);

        let applied = apply_preview_state(&graph, &goals, &preview, now()).unwrap();
        assert_eq!(applied.inserted, vec![c]);
        assert_eq!(applied.archived, vec![GoalId::new("g-a")]);
    }

    #[test]
    fn stale_previews_are_rejected_whole() {
        let graph = graph();
        let goals = committed();
        let mut preview = build_preview_state(&goals);
        preview.add_goal(&graph, &"chats".into(), None).unwrap();

        let moved_on = vec![goals[0].clone()];
        assert_eq!(
            apply_preview_state(&graph, &moved_on, &preview, now()),
            Err(ValidationError::StalePreview("ev".into()))
        );
    }

    #[test]
    fn weights_are_range_checked() {
        let mut preview = build_preview_state(&committed());
        assert!(matches!(
            preview.reweight_goal(&"ev".into(), 1.5),
            Err(ValidationError::WeightOutOfRange { .. })
        ));
        assert!(matches!(
            preview.reweight_goal(&"ev".into(), f64::NAN),
            Err(ValidationError::WeightOutOfRange { .. })
        ));
        assert!(preview.is_unchanged());
    }
}
