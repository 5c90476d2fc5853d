use pretty_assertions::assert_eq;
use std::path::Path;
use stride_cli::{load_config, run_freeze, run_ladder, run_pacing, run_tree, GoalData};
use stride_core::{EngineConfig, GoalsService};
use stride_graph::GoalId;
use stride_milestone::CurvePreset;
use stride_test_utils::{day, eighty_forty_snapshots, three_area_goals, three_area_graph};

fn write_json<T: serde::Serialize>(dir: &Path, name: &str, value: &T) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, serde_json::to_string(value).unwrap()).unwrap();
    path
}

fn fixture_data(dir: &Path) -> GoalData {
    let goals = write_json(dir, "goals.json", &three_area_goals());
    let snaps = write_json(dir, "snapshots.json", &eighty_forty_snapshots(day(2025, 1, 10)));
    GoalData::load(&goals, Some(&snaps)).unwrap()
}

#[test]
fn goal_files_round_through_the_tree_command() {
    let dir = tempfile::tempdir().unwrap();
    let data = fixture_data(dir.path());
    assert_eq!(data.goals.len(), 9);
    assert_eq!(data.snapshots.len(), 6);

    let graph = three_area_graph();
    let service = GoalsService::new(&graph, EngineConfig::default()).unwrap();
    let dating = run_tree(
        &service,
        &data,
        day(2025, 1, 10),
        &["lifeArea=dating".to_string()],
    )
    .unwrap();
    assert_eq!(dating.len(), 3);
    let root = dating.iter().find(|g| g.parent_id.is_none()).unwrap();
    assert!((root.progress - 60.0).abs() < 1e-9);

    assert!(run_tree(&service, &data, day(2025, 1, 10), &["oops".to_string()]).is_err());
}

#[test]
fn stale_goals_are_listed_for_freezing() {
    let dir = tempfile::tempdir().unwrap();
    let data = fixture_data(dir.path());
    let graph = three_area_graph();
    let service = GoalsService::new(&graph, EngineConfig::default()).unwrap();

    let leaf = GoalId::new("g-dating-primary");
    assert!(!run_freeze(&service, &data, day(2025, 1, 20)).contains(&leaf));
    // 14 days after the 2025-01-10 snapshots
    assert!(run_freeze(&service, &data, day(2025, 1, 24)).contains(&leaf));
}

#[test]
fn pacing_requires_a_known_goal() {
    let dir = tempfile::tempdir().unwrap();
    let data = fixture_data(dir.path());
    let graph = three_area_graph();
    let service = GoalsService::new(&graph, EngineConfig::default()).unwrap();

    let report = run_pacing(&service, &data, &GoalId::new("g-dating-primary"), day(2025, 1, 10)).unwrap();
    assert_eq!(report.pacing.current_value, 80.0);
    assert!(!report.will_gate.gated);
    assert!(run_pacing(&service, &data, &GoalId::new("g-missing"), day(2025, 1, 10)).is_err());
}

#[test]
fn ladder_and_config_commands() {
    let ladder = run_ladder(0.0, 1000.0, 3, CurvePreset::Linear).unwrap();
    assert_eq!(ladder, vec![200.0, 500.0, 1000.0]);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("engine.json");
    std::fs::write(&path, r#"{"staleness_threshold_days": 21}"#).unwrap();
    assert_eq!(load_config(Some(&path)).unwrap().staleness_threshold_days, 21);
    assert_eq!(load_config(None).unwrap(), EngineConfig::default());
}
