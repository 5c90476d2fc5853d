//! Badge computation over goal collections

use crate::tier::{progress_to_tier, BadgeTier, BadgeTiers};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Anything that carries a progress percentage and a stable id
pub trait Progressed {
    /// Key used in badge maps
    type Id: Ord + Clone;

    /// Stable id of the item
    fn badge_id(&self) -> Self::Id;

    /// Current progress in `[0, 100]`, `None` when there is no data yet
    fn progress(&self) -> Option<f64>;
}

/// Tier of a single goal
#[must_use]
pub fn compute_badge<G: Progressed>(goal: &G, tiers: &BadgeTiers) -> BadgeTier {
    progress_to_tier(goal.progress(), tiers).clone()
}

/// Tier of every goal, keyed by goal id
#[must_use]
pub fn compute_all_badges<G: Progressed>(goals: &[G], tiers: &BadgeTiers) -> BTreeMap<G::Id, BadgeTier> {
    goals
        .iter()
        .map(|g| (g.badge_id(), compute_badge(g, tiers)))
        .collect()
}

/// Tier movement of one goal between two badge maps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BadgeChange<K> {
    /// Goal id
    pub id: K,
    /// Tier before
    pub from: BadgeTier,
    /// Tier after
    pub to: BadgeTier,
    /// Whether the goal moved up
    pub promoted: bool,
}

/// Whether `to` ranks above `from` in `tiers`. Tiers missing from the table
/// compare by threshold.
fn is_promotion(from: &BadgeTier, to: &BadgeTier, tiers: &BadgeTiers) -> bool {
    match (tiers.rank_of(&from.name), tiers.rank_of(&to.name)) {
        (Some(from), Some(to)) => to > from,
        _ => to.min_progress > from.min_progress,
    }
}

/// Goals whose tier differs between `before` and `after`.
///
/// Goals missing from `before` are compared against the lowest tier; goals
/// missing from `after` are ignored.
#[must_use]
pub fn badge_changes<K: Ord + Clone>(
    before: &BTreeMap<K, BadgeTier>,
    after: &BTreeMap<K, BadgeTier>,
    tiers: &BadgeTiers,
) -> Vec<BadgeChange<K>> {
    after
        .iter()
        .filter_map(|(id, to)| {
            let from = before.get(id).unwrap_or_else(|| tiers.lowest());
            if from.name == to.name {
                return None;
            }
            Some(BadgeChange {
                id: id.clone(),
                from: from.clone(),
                to: to.clone(),
                promoted: is_promotion(from, to, tiers),
            })
        })
        .collect()
}
