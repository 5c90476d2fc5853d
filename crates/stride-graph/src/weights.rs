//! Achievement weights
//!
//! Every sibling group (children of one parent, or the set of roots) carries
//! weights that sum to 1. Structural changes go through [`redistribute_weights`]
//! so the invariant is restored instead of siblings being dropped.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Allowed drift of a sibling weight sum from 1
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Weight per goal or template id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightTable<K: Ord> {
    weights: BTreeMap<K, f64>,
}

impl<K: Ord> Default for WeightTable<K> {
    fn default() -> Self {
        Self {
            weights: BTreeMap::new(),
        }
    }
}

impl<K: Ord + Clone> FromIterator<(K, f64)> for WeightTable<K> {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        Self {
            weights: iter.into_iter().collect(),
        }
    }
}

/// Structural change to a sibling group
#[derive(Debug, Clone, PartialEq)]
pub enum WeightChange<K> {
    /// A sibling joins the group
    Added {
        /// New sibling
        id: K,
        /// Requested share; `None` means an equal share
        weight: Option<f64>,
    },
    /// A sibling leaves the group
    Removed {
        /// Departing sibling
        id: K,
    },
}

impl<K: Ord + Clone> WeightTable<K> {
    /// Create empty table
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Weight of `id`
    #[inline]
    #[must_use]
    pub fn get(&self, id: &K) -> Option<f64> {
        self.weights.get(id).copied()
    }

    /// Weight of `id`, or `fallback` when absent
    #[inline]
    #[must_use]
    pub fn weight_or(&self, id: &K, fallback: f64) -> f64 {
        self.get(id).unwrap_or(fallback)
    }

    /// Set the weight of `id`
    #[inline]
    pub fn insert(&mut self, id: K, weight: f64) {
        self.weights.insert(id, weight);
    }

    /// Drop `id` from the table
    #[inline]
    pub fn remove(&mut self, id: &K) -> Option<f64> {
        self.weights.remove(id)
    }

    /// Number of entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// Whether the table is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Iterate entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (&K, f64)> + '_ {
        self.weights.iter().map(|(k, w)| (k, *w))
    }

    /// Sum of the weights of `ids` (absent ids count as 0)
    #[must_use]
    pub fn sum_of(&self, ids: &[K]) -> f64 {
        ids.iter().map(|id| self.weight_or(id, 0.0)).sum()
    }

    /// Whether the weights of `ids` sum to 1 within tolerance
    #[must_use]
    pub fn is_balanced(&self, ids: &[K]) -> bool {
        ids.is_empty() || (self.sum_of(ids) - 1.0).abs() <= WEIGHT_SUM_TOLERANCE
    }

    /// Rescale `ids` proportionally so they sum to 1.
    ///
    /// A group whose weights are all zero (or absent) is split equally.
    pub fn normalize_group(&mut self, ids: &[K]) {
        if ids.is_empty() {
            return;
        }
        let sum: f64 = ids.iter().map(|id| self.weight_or(id, 0.0).max(0.0)).sum();
        if sum <= f64::EPSILON {
            let share = 1.0 / ids.len() as f64;
            for id in ids {
                self.weights.insert(id.clone(), share);
            }
            return;
        }
        for id in ids {
            let w = self.weight_or(id, 0.0).max(0.0);
            self.weights.insert(id.clone(), w / sum);
        }
    }

    /// Apply a structural change in place. `siblings` is the group before the change.
    pub fn apply_change(&mut self, siblings: &[K], change: WeightChange<K>) {
        match change {
            WeightChange::Added { id, weight } => {
                let existing: Vec<K> = siblings.iter().filter(|s| **s != id).cloned().collect();
                if existing.is_empty() {
                    self.weights.insert(id, 1.0);
                    return;
                }
                let equal_share = 1.0 / (existing.len() + 1) as f64;
                let share = weight.unwrap_or(equal_share).clamp(0.0, 1.0);
                let free = 1.0 - share;
                let current: f64 = existing
                    .iter()
                    .map(|s| self.weight_or(s, 0.0).max(0.0))
                    .sum();
                for s in &existing {
                    let scaled = if current <= f64::EPSILON {
                        free / existing.len() as f64
                    } else {
                        self.weight_or(s, 0.0).max(0.0) * free / current
                    };
                    self.weights.insert(s.clone(), scaled);
                }
                self.weights.insert(id, share);
            }
            WeightChange::Removed { id } => {
                self.weights.remove(&id);
                let remaining: Vec<K> = siblings.iter().filter(|s| **s != id).cloned().collect();
                self.normalize_group(&remaining);
            }
        }
    }
}

/// Recompute sibling weights after a child is added or removed.
///
/// Returns a new table; `table` is left untouched.
#[must_use]
pub fn redistribute_weights<K: Ord + Clone>(
    table: &WeightTable<K>,
    siblings: &[K],
    change: WeightChange<K>,
) -> WeightTable<K> {
    let mut next = table.clone();
    next.apply_change(siblings, change);
    next
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(entries: &[(&'static str, f64)]) -> WeightTable<&'static str> {
        entries.iter().copied().collect()
    }

    #[test]
    fn added_sibling_scales_existing_proportionally() {
        let t = table(&[("a", 0.75), ("b", 0.25)]);
        let next = redistribute_weights(
            &t,
            &["a", "b"],
            WeightChange::Added {
                id: "c",
                weight: Some(0.2),
            },
        );
        assert!((next.get(&"a").unwrap() - 0.6).abs() < 1e-9);
        assert!((next.get(&"b").unwrap() - 0.2).abs() < 1e-9);
        assert!((next.get(&"c").unwrap() - 0.2).abs() < 1e-9);
        assert!(next.is_balanced(&["a", "b", "c"]));
    }

    #[test]
    fn added_without_weight_takes_equal_share() {
        let t = table(&[("a", 0.5), ("b", 0.5)]);
        let next = redistribute_weights(&t, &["a", "b"], WeightChange::Added { id: "c", weight: None });
        assert!((next.get(&"c").unwrap() - 1.0 / 3.0).abs() < 1e-9);
        assert!(next.is_balanced(&["a", "b", "c"]));
    }

    #[test]
    fn first_child_gets_full_weight() {
        let next = redistribute_weights(
            &WeightTable::new(),
            &[],
            WeightChange::Added {
                id: "only",
                weight: Some(0.3),
            },
        );
        assert_eq!(next.get(&"only"), Some(1.0));
    }

    #[test]
    fn removal_renormalizes_remaining() {
        let t = table(&[("a", 0.5), ("b", 0.3), ("c", 0.2)]);
        let next = redistribute_weights(&t, &["a", "b", "c"], WeightChange::Removed { id: "a" });
        assert_eq!(next.get(&"a"), None);
        assert!((next.get(&"b").unwrap() - 0.6).abs() < 1e-9);
        assert!((next.get(&"c").unwrap() - 0.4).abs() < 1e-9);
    }

    #[test]
    fn zero_group_splits_equally() {
        let mut t = table(&[("a", 0.0), ("b", 0.0)]);
        t.normalize_group(&["a", "b"]);
        assert_eq!(t.get(&"a"), Some(0.5));
        assert_eq!(t.get(&"b"), Some(0.5));
    }
}
