//! Goal Graph
//!
//! Adjacency table over template ids, validated once at load time. The
//! validated graph is immutable; every lookup afterwards is infallible.

use crate::catalog::GoalCatalog;
use crate::error::ConfigError;
use crate::template::{GoalGraphEdge, GoalTemplate, TemplateId};
use crate::weights::{WeightTable, WEIGHT_SUM_TOLERANCE};
use indexmap::IndexMap;
use std::collections::{BTreeMap, HashMap, HashSet};

const ROOT_GROUP: &str = "<root>";

/// Validated template forest
#[derive(Debug, Clone)]
pub struct GoalGraph {
    templates: IndexMap<TemplateId, GoalTemplate>,
    children: HashMap<TemplateId, Vec<TemplateId>>,
    parents: HashMap<TemplateId, TemplateId>,
    roots: Vec<TemplateId>,
    default_weights: WeightTable<TemplateId>,
}

impl GoalGraph {
    /// Build and validate the graph.
    ///
    /// # Errors
    /// [`ConfigError`] for duplicate ids, unknown or self edges, a child with
    /// two parents, cycles, out-of-range weights, unbalanced sibling groups
    /// or graduation rules that skip a phase.
    pub fn load(
        templates: Vec<GoalTemplate>,
        edges: Vec<GoalGraphEdge>,
    ) -> Result<Self, ConfigError> {
        let mut by_id = IndexMap::with_capacity(templates.len());
        for template in templates {
            if !(0.0..=1.0).contains(&template.default_weight) {
                return Err(ConfigError::WeightOutOfRange {
                    id: template.id.clone(),
                    weight: template.default_weight,
                });
            }
            if let Some(rule) = template.graduation {
                if rule.from.next() != Some(rule.to) {
                    return Err(ConfigError::PhaseSkip {
                        id: template.id.clone(),
                        from: rule.from,
                        to: rule.to,
                    });
                }
            }
            if by_id.contains_key(&template.id) {
                return Err(ConfigError::DuplicateTemplate(template.id));
            }
            by_id.insert(template.id.clone(), template);
        }

        let mut children: HashMap<TemplateId, Vec<TemplateId>> = HashMap::new();
        let mut parents: HashMap<TemplateId, TemplateId> = HashMap::new();
        for edge in edges {
            for end in [&edge.parent, &edge.child] {
                if !by_id.contains_key(end) {
                    return Err(ConfigError::UnknownTemplate(end.clone()));
                }
            }
            if edge.parent == edge.child {
                return Err(ConfigError::SelfEdge(edge.child));
            }
            if let Some(first) = parents.get(&edge.child) {
                return Err(ConfigError::MultipleParents {
                    child: edge.child.clone(),
                    first: first.clone(),
                    second: edge.parent,
                });
            }
            parents.insert(edge.child.clone(), edge.parent.clone());
            children.entry(edge.parent).or_default().push(edge.child);
        }

        if let Some(path) = find_cycle(&by_id, &children) {
            return Err(ConfigError::Cycle { path });
        }

        let roots: Vec<TemplateId> = by_id
            .keys()
            .filter(|id| !parents.contains_key(*id))
            .cloned()
            .collect();

        let default_weights: WeightTable<TemplateId> = by_id
            .values()
            .map(|t| (t.id.clone(), t.default_weight))
            .collect();

        check_group(&default_weights, ROOT_GROUP, &roots)?;
        for (parent, group) in &children {
            check_group(&default_weights, parent.as_str(), group)?;
        }

        tracing::info!(
            templates = by_id.len(),
            roots = roots.len(),
            "goal graph loaded"
        );

        Ok(Self {
            templates: by_id,
            children,
            parents,
            roots,
            default_weights,
        })
    }

    /// Build from a parsed catalog
    ///
    /// # Errors
    /// See [`GoalGraph::load`]
    pub fn from_catalog(catalog: GoalCatalog) -> Result<Self, ConfigError> {
        Self::load(catalog.templates, catalog.edges)
    }

    /// Graph of the bundled catalog
    ///
    /// # Errors
    /// Only if the bundled catalog is malformed
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_catalog(GoalCatalog::builtin()?)
    }

    /// Number of templates
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Whether the graph has no templates
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Whether `id` is a known template
    #[inline]
    #[must_use]
    pub fn contains(&self, id: &TemplateId) -> bool {
        self.templates.contains_key(id)
    }

    /// Look up a template
    #[inline]
    #[must_use]
    pub fn template(&self, id: &TemplateId) -> Option<&GoalTemplate> {
        self.templates.get(id)
    }

    /// All templates in catalog order
    pub fn templates(&self) -> impl Iterator<Item = &GoalTemplate> + '_ {
        self.templates.values()
    }

    /// Direct children in edge order; empty for leaves and unknown ids
    #[must_use]
    pub fn children(&self, id: &TemplateId) -> &[TemplateId] {
        self.children.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Parent template
    #[inline]
    #[must_use]
    pub fn parent(&self, id: &TemplateId) -> Option<&TemplateId> {
        self.parents.get(id)
    }

    /// Templates without a parent, in catalog order
    #[inline]
    #[must_use]
    pub fn roots(&self) -> &[TemplateId] {
        &self.roots
    }

    /// Whether `id` has no children
    #[inline]
    #[must_use]
    pub fn is_leaf(&self, id: &TemplateId) -> bool {
        self.children(id).is_empty()
    }

    /// All templates with no children, in catalog order
    #[must_use]
    pub fn leaf_goals(&self) -> Vec<&GoalTemplate> {
        self.templates
            .values()
            .filter(|t| self.is_leaf(&t.id))
            .collect()
    }

    /// Ancestors of `id`, nearest first
    #[must_use]
    pub fn ancestors(&self, id: &TemplateId) -> Vec<TemplateId> {
        let mut out = Vec::new();
        let mut cursor = self.parents.get(id);
        while let Some(parent) = cursor {
            out.push(parent.clone());
            cursor = self.parents.get(parent);
        }
        out
    }

    /// Sibling group of `id` (including `id`): its parent's children, or the roots
    #[must_use]
    pub fn sibling_group(&self, id: &TemplateId) -> &[TemplateId] {
        match self.parents.get(id) {
            Some(parent) => self.children(parent),
            None => &self.roots,
        }
    }

    /// Default weight table, one entry per template
    #[inline]
    #[must_use]
    pub fn default_weights(&self) -> &WeightTable<TemplateId> {
        &self.default_weights
    }

    /// Effective weights: user overrides where present, defaults elsewhere.
    ///
    /// Every sibling group is renormalized afterwards so the sum-to-one
    /// invariant survives arbitrary overrides. Overrides for unknown
    /// templates are ignored.
    #[must_use]
    pub fn achievement_weights(
        &self,
        overrides: &BTreeMap<TemplateId, f64>,
    ) -> WeightTable<TemplateId> {
        let mut table = self.default_weights.clone();
        let mut touched_groups: HashSet<Option<&TemplateId>> = HashSet::new();
        for (id, weight) in overrides {
            if !self.contains(id) {
                tracing::debug!(template = %id, "ignoring weight override for unknown template");
                continue;
            }
            table.insert(id.clone(), weight.clamp(0.0, 1.0));
            touched_groups.insert(self.parents.get(id));
        }
        for group in touched_groups {
            let members = match group {
                Some(parent) => self.children(parent),
                None => &self.roots,
            };
            table.normalize_group(members);
        }
        table
    }
}

fn check_group(
    weights: &WeightTable<TemplateId>,
    parent: &str,
    group: &[TemplateId],
) -> Result<(), ConfigError> {
    let sum = weights.sum_of(group);
    if !group.is_empty() && (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
        return Err(ConfigError::UnbalancedWeights {
            parent: parent.to_string(),
            sum,
        });
    }
    Ok(())
}

/// Depth-first search for a cycle; returns the cycle path if one exists
fn find_cycle(
    templates: &IndexMap<TemplateId, GoalTemplate>,
    children: &HashMap<TemplateId, Vec<TemplateId>>,
) -> Option<Vec<TemplateId>> {
    fn dfs<'a>(
        node: &'a TemplateId,
        children: &'a HashMap<TemplateId, Vec<TemplateId>>,
        stack: &mut Vec<&'a TemplateId>,
        visited: &mut HashSet<&'a TemplateId>,
    ) -> Option<Vec<TemplateId>> {
        if let Some(pos) = stack.iter().position(|n| *n == node) {
            return Some(stack[pos..].iter().map(|n| (*n).clone()).collect());
        }
        if visited.contains(node) {
            return None;
        }
        stack.push(node);
        if let Some(next) = children.get(node) {
            for child in next {
                if let Some(path) = dfs(child, children, stack, visited) {
                    return Some(path);
                }
            }
        }
        stack.pop();
        visited.insert(node);
        None
    }

    let mut visited = HashSet::new();
    let mut stack = Vec::new();
    for id in templates.keys() {
        if !visited.contains(id) {
            if let Some(path) = dfs(id, children, &mut stack, &mut visited) {
                return Some(path);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::{GoalCategory, GraduationRule, LifeArea, Phase};
    use pretty_assertions::assert_eq;

    fn tpl(id: &str, weight: f64) -> GoalTemplate {
        GoalTemplate::new(id, GoalCategory::Habit, LifeArea::Fitness, weight)
    }

    fn small_graph() -> GoalGraph {
        GoalGraph::load(
            vec![tpl("root", 1.0), tpl("a", 0.5), tpl("b", 0.5), tpl("a1", 1.0)],
            vec![
                GoalGraphEdge::new("root", "a"),
                GoalGraphEdge::new("root", "b"),
                GoalGraphEdge::new("a", "a1"),
            ],
        )
        .unwrap()
    }

    #[test]
    fn children_keep_edge_order() {
        let graph = small_graph();
        assert_eq!(
            graph.children(&"root".into()),
            &[TemplateId::new("a"), TemplateId::new("b")]
        );
        assert!(graph.children(&"b".into()).is_empty());
        assert!(graph.children(&"nope".into()).is_empty());
    }

    #[test]
    fn leaf_goals_are_childless_templates() {
        let graph = small_graph();
        let leaves: Vec<String> = graph.leaf_goals().iter().map(|t| t.id.to_string()).collect();
        assert_eq!(leaves, vec!["b".to_string(), "a1".to_string()]);
    }

    #[test]
    fn ancestors_nearest_first() {
        let graph = small_graph();
        assert_eq!(
            graph.ancestors(&"a1".into()),
            vec![TemplateId::new("a"), TemplateId::new("root")]
        );
        assert!(graph.ancestors(&"root".into()).is_empty());
    }

    #[test]
    fn rejects_cycle() {
        let err = GoalGraph::load(
            vec![tpl("x", 1.0), tpl("y", 1.0)],
            vec![GoalGraphEdge::new("x", "y"), GoalGraphEdge::new("y", "x")],
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Cycle { .. }));
    }

    #[test]
    fn rejects_unknown_template() {
        let err = GoalGraph::load(vec![tpl("x", 1.0)], vec![GoalGraphEdge::new("x", "ghost")])
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownTemplate(id) if id.as_str() == "ghost"));
    }

    #[test]
    fn rejects_second_parent() {
        let err = GoalGraph::load(
            vec![tpl("p", 0.5), tpl("q", 0.5), tpl("c", 1.0)],
            vec![GoalGraphEdge::new("p", "c"), GoalGraphEdge::new("q", "c")],
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::MultipleParents { .. }));
    }

    #[test]
    fn rejects_unbalanced_siblings() {
        let err = GoalGraph::load(
            vec![tpl("root", 1.0), tpl("a", 0.5), tpl("b", 0.4)],
            vec![GoalGraphEdge::new("root", "a"), GoalGraphEdge::new("root", "b")],
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::UnbalancedWeights { .. }));
    }

    #[test]
    fn rejects_graduation_that_skips_a_phase() {
        let rule = GraduationRule {
            from: Phase::Foundation,
            to: Phase::Mastery,
            threshold: 50.0,
        };
        let err = GoalGraph::load(vec![tpl("x", 1.0).with_graduation(rule)], vec![]).unwrap_err();
        assert!(matches!(err, ConfigError::PhaseSkip { .. }));

        let rule = GraduationRule {
            to: Phase::Momentum,
            ..rule
        };
        assert!(GoalGraph::load(vec![tpl("x", 1.0).with_graduation(rule)], vec![]).is_ok());
    }

    #[test]
    fn overrides_renormalize_their_group() {
        let graph = small_graph();
        let mut overrides = BTreeMap::new();
        overrides.insert(TemplateId::new("a"), 0.75);
        let weights = graph.achievement_weights(&overrides);
        let a = weights.get(&"a".into()).unwrap();
        let b = weights.get(&"b".into()).unwrap();
        assert!((a + b - 1.0).abs() < 1e-9);
        assert!((a - 0.75 / 1.25).abs() < 1e-9);
        assert_eq!(weights.get(&"a1".into()), Some(1.0));
    }

    #[test]
    fn builtin_graph_validates() {
        let graph = GoalGraph::builtin().unwrap();
        assert_eq!(graph.roots().len(), 3);
        assert!(graph.is_leaf(&"approach-volume".into()));
    }
}
