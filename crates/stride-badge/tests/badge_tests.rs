use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::collections::BTreeMap;
use stride_badge::{badge_changes, progress_to_tier, BadgeTier, BadgeTiers};

proptest! {
    #[test]
    fn prop_progress_to_tier_is_monotonic(a in -50.0f64..150.0, b in -50.0f64..150.0) {
        let tiers = BadgeTiers::default();
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        let rank = |p: f64| tiers.rank_of(&progress_to_tier(Some(p), &tiers).name);
        prop_assert!(rank(low).is_some());
        prop_assert!(rank(low) <= rank(high));
    }

    #[test]
    fn prop_tier_threshold_never_exceeds_progress(p in 0.0f64..150.0) {
        let tiers = BadgeTiers::default();
        prop_assert!(progress_to_tier(Some(p), &tiers).min_progress <= p);
    }
}

#[test]
fn promotion_follows_tier_order() {
    let tiers = BadgeTiers::default();
    // Silver recorded under an older table with a higher threshold
    let before = BTreeMap::from([("a", BadgeTier::new("Silver", 80.0))]);
    let after = BTreeMap::from([("a", BadgeTier::new("Gold", 75.0))]);
    let changes = badge_changes(&before, &after, &tiers);
    assert_eq!(changes.len(), 1);
    assert!(changes[0].promoted);
}

#[test]
fn unknown_tiers_compare_by_threshold() {
    let tiers = BadgeTiers::default();
    let before = BTreeMap::from([("a", BadgeTier::new("Legacy", 90.0))]);
    let after = BTreeMap::from([("a", BadgeTier::new("Gold", 75.0))]);
    let changes = badge_changes(&before, &after, &tiers);
    assert_eq!(changes.len(), 1);
    assert!(!changes[0].promoted);
}
