use proptest::prelude::*;
use std::collections::BTreeMap;
use stride_graph::DailySnapshot;
use stride_milestone::{
    compute_achievement_progress, generate_milestone_ladder, round_to_nice_number,
    CurveControlPoint, CurvePreset, MilestoneLadderConfig,
};
use stride_test_utils::{
    day, eighty_forty_snapshots, goal_id, leaf_template, three_area_goals, three_area_graph,
};

fn preset() -> impl Strategy<Value = CurvePreset> {
    prop_oneof![
        Just(CurvePreset::Linear),
        Just(CurvePreset::EaseIn),
        Just(CurvePreset::EaseOut),
    ]
}

proptest! {
    #[test]
    fn prop_round_to_nice_number_is_idempotent(x in 1e-6f64..1e9) {
        let once = round_to_nice_number(x);
        prop_assert_eq!(round_to_nice_number(once), once);
    }

    #[test]
    fn prop_ladder_is_strictly_increasing_with_exact_length(
        start in 0.0f64..500.0,
        span in 1.0f64..10_000.0,
        rungs in 1usize..15,
        curve in preset(),
    ) {
        let config = MilestoneLadderConfig::new(start, start + span, rungs).with_preset(curve);
        let ladder = generate_milestone_ladder(&config).unwrap();
        prop_assert_eq!(ladder.len(), rungs);
        prop_assert!(ladder[0] > start);
        for pair in ladder.windows(2) {
            prop_assert!(pair[0] < pair[1]);
        }
        prop_assert_eq!(ladder.last().copied(), Some(start + span));
        prop_assert!(ladder.iter().all(|v| *v <= start + span));
    }
}

#[test]
fn custom_curve_is_honoured() {
    let config = MilestoneLadderConfig::new(0.0, 100.0, 2).with_points(vec![
        CurveControlPoint::new(0.0, 0.0),
        CurveControlPoint::new(0.5, 0.1),
        CurveControlPoint::new(1.0, 1.0),
    ]);
    assert_eq!(generate_milestone_ladder(&config).unwrap(), vec![10.0, 100.0]);
}

#[test]
fn three_areas_at_eighty_forty_score_sixty() {
    let graph = three_area_graph();
    let goals = three_area_goals();
    let snapshots = eighty_forty_snapshots(day(2025, 1, 10));

    let score = compute_achievement_progress(&graph, graph.default_weights(), &goals, &snapshots);
    assert!((score - 60.0).abs() < 1e-9, "score was {score}");
}

#[test]
fn missing_snapshots_count_as_zero() {
    let graph = three_area_graph();
    let goals = three_area_goals();
    let only_one = vec![DailySnapshot::new(
        goal_id(&leaf_template(stride_graph::LifeArea::Dating, false)),
        day(2025, 1, 10),
        90.0,
    )];

    let score = compute_achievement_progress(&graph, graph.default_weights(), &goals, &only_one);
    // 90 × 0.5 × 1/3
    assert!((score - 15.0).abs() < 1e-9, "score was {score}");
}

#[test]
fn overrides_shift_the_score() {
    let graph = three_area_graph();
    let goals = three_area_goals();
    let snapshots = eighty_forty_snapshots(day(2025, 1, 10));

    let mut overrides: BTreeMap<stride_graph::TemplateId, f64> = BTreeMap::new();
    for area in stride_test_utils::AREAS {
        overrides.insert(leaf_template(area, false).as_str().into(), 1.0);
        overrides.insert(leaf_template(area, true).as_str().into(), 0.0);
    }
    let weights = graph.achievement_weights(&overrides);
    let score = compute_achievement_progress(&graph, &weights, &goals, &snapshots);
    assert!((score - 80.0).abs() < 1e-9, "score was {score}");
}
