//! Bottleneck detection
//!
//! The bottleneck is the leaf whose shortfall `weight × (100 − progress)`
//! drags its ancestors down the most. Ties go to the smaller goal id.

use crate::tree::{GoalNode, GoalTree};
use serde::{Deserialize, Serialize};
use stride_graph::{GoalId, LifeArea, TemplateId};

const TIE_EPSILON: f64 = 1e-12;

/// The goal holding its parent back the most
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bottleneck {
    /// Goal id
    pub goal_id: GoalId,
    /// Template of the goal
    pub template_id: TemplateId,
    /// Life area of the goal
    pub life_area: LifeArea,
    /// Current progress
    pub progress: f64,
    /// Weight used for the shortfall (path product for tree-wide search)
    pub weight: f64,
    /// `weight × (100 − progress)`
    pub shortfall: f64,
}

impl Bottleneck {
    fn of(node: &GoalNode, weight: f64) -> Self {
        Self {
            goal_id: node.goal.id.clone(),
            template_id: node.goal.template_id.clone(),
            life_area: node.goal.life_area,
            progress: node.goal.progress,
            weight,
            shortfall: weight * (100.0 - node.goal.progress),
        }
    }

    fn beats(&self, other: &Self) -> bool {
        let diff = self.shortfall - other.shortfall;
        diff > TIE_EPSILON || (diff.abs() <= TIE_EPSILON && self.goal_id < other.goal_id)
    }
}

/// Bottleneck among the direct, non-archived children of `parent`
#[must_use]
pub fn bottleneck_among(parent: &GoalNode) -> Option<Bottleneck> {
    pick(
        parent
            .children
            .iter()
            .filter(|c| !c.goal.archived)
            .map(|c| Bottleneck::of(c, c.goal.weight)),
    )
}

/// Tree-wide bottleneck.
///
/// Every non-archived leaf competes with its global weight, the product of the
/// weights along its path from the root.
#[must_use]
pub fn compute_bottleneck(tree: &GoalTree) -> Option<Bottleneck> {
    let mut candidates = Vec::new();
    let mut stack: Vec<(&GoalNode, f64)> = tree
        .roots
        .iter()
        .filter(|r| !r.goal.archived)
        .map(|r| (r, r.goal.weight))
        .collect();
    while let Some((node, weight)) = stack.pop() {
        let active: Vec<&GoalNode> = node.children.iter().filter(|c| !c.goal.archived).collect();
        if active.is_empty() {
            candidates.push(Bottleneck::of(node, weight));
        } else {
            stack.extend(active.into_iter().map(|c| (c, weight * c.goal.weight)));
        }
    }
    pick(candidates.into_iter())
}

fn pick(candidates: impl Iterator<Item = Bottleneck>) -> Option<Bottleneck> {
    candidates.fold(None, |best, next| match best {
        Some(best) if !next.beats(&best) => Some(best),
        _ => Some(next),
    })
}
