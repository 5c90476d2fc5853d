//! Goal tree assembly
//!
//! Turns flat goal rows into a hierarchy following each row's `parent_id`
//! and attaches progress bottom-up:
//! - leaves: latest snapshot value against the goal's target
//! - parents: weighted mean of their non-archived children
//!
//! Sibling weights come from the template weight table and are renormalized
//! among the siblings actually present. Children are ordered by goal id, so
//! the same input always yields the same tree.

use crate::config::EngineConfig;
use crate::horizon::derive_time_horizon;
use chrono::{DateTime, NaiveDate, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use stride_badge::Progressed;
use stride_graph::{
    Cadence, DailySnapshot, GoalGraph, GoalId, GoalRecord, GoalTemplate, LifeArea, TemplateId,
    TimeHorizon, WeightTable,
};
use stride_milestone::{latest_snapshots, leaf_progress};

/// Progress counted as complete
const COMPLETE: f64 = 100.0 - 1e-9;

/// A user goal with its computed progress and effective weight
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalWithProgress {
    /// Goal id
    pub id: GoalId,
    /// Template the goal was adopted from
    pub template_id: TemplateId,
    /// Parent in the assembled tree; `None` for roots
    pub parent_id: Option<GoalId>,
    /// Life area of the template
    pub life_area: LifeArea,
    /// Horizon class
    pub horizon: TimeHorizon,
    /// Template cadence
    pub cadence: Cadence,
    /// User target date
    pub target_date: Option<NaiveDate>,
    /// Value that counts as 100%
    pub target_value: f64,
    /// Latest snapshot value, 0 without snapshots
    pub current_value: f64,
    /// Progress in `[0, 100]`
    pub progress: f64,
    /// Share among present siblings
    pub weight: f64,
    /// Progress reached 100
    pub completed: bool,
    /// Retired by the user
    pub archived: bool,
    /// Paused
    pub frozen: bool,
    /// Adoption time
    pub created_at: DateTime<Utc>,
    /// Last row update
    pub last_updated_at: DateTime<Utc>,
    /// Date of the latest snapshot taken into account
    pub last_snapshot_date: Option<NaiveDate>,
}

impl GoalWithProgress {
    /// Last day the goal saw activity: row update or snapshot, whichever is later
    #[must_use]
    pub fn last_activity_date(&self) -> NaiveDate {
        let updated = self.last_updated_at.date_naive();
        self.last_snapshot_date
            .map_or(updated, |snap| snap.max(updated))
    }
}

impl Progressed for GoalWithProgress {
    type Id = GoalId;

    fn badge_id(&self) -> GoalId {
        self.id.clone()
    }

    fn progress(&self) -> Option<f64> {
        Some(self.progress)
    }
}

/// Goal and its children
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalNode {
    /// The goal itself
    #[serde(flatten)]
    pub goal: GoalWithProgress,
    /// Children ordered by goal id
    pub children: Vec<GoalNode>,
}

impl GoalNode {
    /// Whether the node has no children
    #[inline]
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Assembled goal forest
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GoalTree {
    /// Root goals ordered by goal id
    pub roots: Vec<GoalNode>,
}

impl GoalTree {
    /// All nodes, depth-first pre-order
    #[must_use]
    pub fn nodes(&self) -> Vec<&GoalNode> {
        let mut out = Vec::new();
        let mut stack: Vec<&GoalNode> = self.roots.iter().rev().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(node.children.iter().rev());
        }
        out
    }

    /// All goals, depth-first pre-order
    #[must_use]
    pub fn goals(&self) -> Vec<&GoalWithProgress> {
        self.nodes().into_iter().map(|n| &n.goal).collect()
    }

    /// Owned copy of every goal, depth-first pre-order
    #[must_use]
    pub fn flatten(&self) -> Vec<GoalWithProgress> {
        self.nodes().into_iter().map(|n| n.goal.clone()).collect()
    }

    /// Node for `id`
    #[must_use]
    pub fn find(&self, id: &GoalId) -> Option<&GoalNode> {
        self.nodes().into_iter().find(|n| &n.goal.id == id)
    }

    /// Number of goals in the tree
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes().len()
    }

    /// Whether the tree holds no goals
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

/// Assemble the tree from every snapshot. Horizons are the templates' classes.
#[must_use]
pub fn build_goal_tree(
    graph: &GoalGraph,
    weights: &WeightTable<TemplateId>,
    goals: &[GoalRecord],
    snapshots: &[DailySnapshot],
) -> GoalTree {
    assemble(graph, weights, goals, snapshots, None, &|_, template| {
        template.horizon
    })
}

/// Assemble the tree as it stood at the end of `date`.
///
/// Snapshots after `date` are ignored and horizons are derived from target
/// dates relative to `date`.
#[must_use]
pub fn build_goal_tree_as_of(
    graph: &GoalGraph,
    weights: &WeightTable<TemplateId>,
    config: &EngineConfig,
    goals: &[GoalRecord],
    snapshots: &[DailySnapshot],
    date: NaiveDate,
) -> GoalTree {
    assemble(graph, weights, goals, snapshots, Some(date), &|goal, template| {
        derive_time_horizon(goal.target_date, template.horizon, date, config)
    })
}

/// Per life area, the weighted mean of its non-archived root goals
#[must_use]
pub fn compute_life_area_progress(tree: &GoalTree) -> BTreeMap<LifeArea, f64> {
    let mut areas: BTreeMap<LifeArea, Vec<&GoalWithProgress>> = BTreeMap::new();
    for root in tree.roots.iter().filter(|r| !r.goal.archived) {
        areas.entry(root.goal.life_area).or_default().push(&root.goal);
    }
    areas
        .into_iter()
        .map(|(area, roots)| {
            let total: f64 = roots.iter().map(|g| g.weight).sum();
            let progress = if total <= f64::EPSILON {
                roots.iter().map(|g| g.progress).sum::<f64>() / roots.len() as f64
            } else {
                roots.iter().map(|g| g.weight * g.progress).sum::<f64>() / total
            };
            (area, progress.clamp(0.0, 100.0))
        })
        .collect()
}

type HorizonFn<'f> = dyn Fn(&GoalRecord, &GoalTemplate) -> TimeHorizon + 'f;

struct Assembly<'a> {
    weights: &'a WeightTable<TemplateId>,
    known: IndexMap<&'a GoalId, (&'a GoalRecord, &'a GoalTemplate)>,
    children: HashMap<&'a GoalId, Vec<&'a GoalId>>,
    latest: HashMap<&'a GoalId, &'a DailySnapshot>,
    horizon: &'a HorizonFn<'a>,
}

fn assemble(
    graph: &GoalGraph,
    weights: &WeightTable<TemplateId>,
    goals: &[GoalRecord],
    snapshots: &[DailySnapshot],
    as_of: Option<NaiveDate>,
    horizon: &HorizonFn<'_>,
) -> GoalTree {
    let owned: Vec<DailySnapshot>;
    let visible: &[DailySnapshot] = match as_of {
        Some(date) => {
            owned = snapshots.iter().filter(|s| s.date <= date).cloned().collect();
            &owned
        }
        None => snapshots,
    };

    let mut known = IndexMap::with_capacity(goals.len());
    for goal in goals {
        let Some(template) = graph.template(&goal.template_id) else {
            tracing::warn!(goal = %goal.id, template = %goal.template_id, "skipping goal with unknown template");
            continue;
        };
        if known.contains_key(&goal.id) {
            tracing::warn!(goal = %goal.id, "skipping duplicate goal row");
            continue;
        }
        known.insert(&goal.id, (goal, template));
    }

    let mut children: HashMap<&GoalId, Vec<&GoalId>> = HashMap::new();
    let mut roots: Vec<&GoalId> = Vec::new();
    for (&id, &(goal, _)) in &known {
        match goal
            .parent_id
            .as_ref()
            .filter(|p| *p != id && known.contains_key(*p))
        {
            Some(parent) => children.entry(parent).or_default().push(id),
            None => roots.push(id),
        }
    }
    roots.sort();
    for list in children.values_mut() {
        list.sort();
    }

    let latest = latest_snapshots(visible);
    let mut tree = assemble_nodes(
        &Assembly {
            weights,
            known,
            children,
            latest,
            horizon,
        },
        roots,
    );
    distribute_weights(&mut tree.roots, weights);
    tracing::debug!(goals = goals.len(), roots = tree.roots.len(), ?as_of, "goal tree assembled");
    tree
}

fn assemble_nodes<'a>(ctx: &Assembly<'a>, roots: Vec<&'a GoalId>) -> GoalTree {
    let mut visited: HashSet<&GoalId> = HashSet::new();
    let mut nodes = Vec::with_capacity(roots.len());
    for root in roots {
        nodes.push(build_node(ctx, root, None, &mut visited));
    }

    // Rows whose parent chain loops back on itself never reach a root
    let mut stranded: Vec<&GoalId> = ctx
        .known
        .keys()
        .copied()
        .filter(|id| !visited.contains(id))
        .collect();
    stranded.sort();
    for id in stranded {
        if visited.contains(id) {
            continue;
        }
        tracing::warn!(goal = %id, "goal parent chain forms a cycle, treating as root");
        nodes.push(build_node(ctx, id, None, &mut visited));
    }
    GoalTree { roots: nodes }
}

fn build_node<'a>(
    ctx: &Assembly<'a>,
    id: &'a GoalId,
    parent: Option<&GoalId>,
    visited: &mut HashSet<&'a GoalId>,
) -> GoalNode {
    visited.insert(id);
    let (goal, template) = ctx.known[id];

    let mut children = Vec::new();
    if let Some(ids) = ctx.children.get(id) {
        for &child in ids {
            if !visited.contains(child) {
                children.push(build_node(ctx, child, Some(id), visited));
            }
        }
    }
    distribute_weights(&mut children, ctx.weights);

    let snapshot = ctx.latest.get(id);
    let target_value = goal.target_value.unwrap_or(template.target_value);
    let current_value = snapshot.map_or(0.0, |s| s.value);
    let progress = if children.iter().any(|c| !c.goal.archived) {
        children
            .iter()
            .filter(|c| !c.goal.archived)
            .map(|c| c.goal.weight * c.goal.progress)
            .sum::<f64>()
            .clamp(0.0, 100.0)
    } else {
        leaf_progress(current_value, target_value)
    };

    GoalNode {
        goal: GoalWithProgress {
            id: goal.id.clone(),
            template_id: goal.template_id.clone(),
            parent_id: parent.cloned(),
            life_area: template.life_area,
            horizon: (ctx.horizon)(goal, template),
            cadence: template.cadence,
            target_date: goal.target_date,
            target_value,
            current_value,
            progress,
            weight: 0.0,
            completed: progress >= COMPLETE,
            archived: goal.archived,
            frozen: goal.frozen,
            created_at: goal.created_at,
            last_updated_at: goal.last_updated_at,
            last_snapshot_date: snapshot.map(|s| s.date),
        },
        children,
    }
}

/// Template weights renormalized among the non-archived nodes; archived nodes get 0
fn distribute_weights(nodes: &mut [GoalNode], weights: &WeightTable<TemplateId>) {
    let active = nodes.iter().filter(|n| !n.goal.archived).count();
    let raw: Vec<f64> = nodes
        .iter()
        .map(|n| {
            if n.goal.archived {
                0.0
            } else {
                weights.weight_or(&n.goal.template_id, 0.0).max(0.0)
            }
        })
        .collect();
    let sum: f64 = raw.iter().sum();
    for (node, w) in nodes.iter_mut().zip(raw) {
        node.goal.weight = if node.goal.archived {
            0.0
        } else if sum <= f64::EPSILON {
            1.0 / active as f64
        } else {
            w / sum
        };
    }
}
