//! Testing utilities for the Stride workspace
//!
//! Shared fixtures: a small three-area goal graph, matching goal rows and
//! snapshot builders.

#![allow(missing_docs)]

use chrono::{DateTime, Days, NaiveDate, TimeZone, Utc};
use stride_graph::{
    Cadence, DailySnapshot, GoalCategory, GoalGraph, GoalGraphEdge, GoalRecord, GoalTemplate,
    GraduationRule, LifeArea, Phase, TimeHorizon,
};

pub const AREAS: [LifeArea; 3] = [LifeArea::Dating, LifeArea::Social, LifeArea::Fitness];

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn ts(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 9, 0, 0).unwrap()
}

/// Template id of an area's first or second leaf
pub fn leaf_template(area: LifeArea, second: bool) -> String {
    format!("{area}-{}", if second { "secondary" } else { "primary" })
}

/// Goal id for a template id
pub fn goal_id(template: &str) -> String {
    format!("g-{template}")
}

/// Three area roots (equal weight), each with two daily leaves at 0.5/0.5.
///
/// The primary dating leaf graduates Foundation → Momentum at 50%.
pub fn three_area_templates() -> (Vec<GoalTemplate>, Vec<GoalGraphEdge>) {
    let mut templates = Vec::new();
    let mut edges = Vec::new();
    for area in AREAS {
        templates.push(
            GoalTemplate::new(area.as_str(), GoalCategory::Area, area, 1.0 / 3.0)
                .with_horizon(TimeHorizon::Long),
        );
        for second in [false, true] {
            let id = leaf_template(area, second);
            let mut leaf = GoalTemplate::new(id.clone(), GoalCategory::Habit, area, 0.5)
                .with_cadence(Cadence::Daily)
                .with_target(100.0);
            if area == LifeArea::Dating && !second {
                leaf = leaf.with_graduation(GraduationRule {
                    from: Phase::Foundation,
                    to: Phase::Momentum,
                    threshold: 50.0,
                });
            }
            templates.push(leaf);
            edges.push(GoalGraphEdge::new(area.as_str(), id));
        }
    }
    (templates, edges)
}

pub fn three_area_graph() -> GoalGraph {
    let (templates, edges) = three_area_templates();
    GoalGraph::load(templates, edges).unwrap()
}

/// One goal per template of [`three_area_graph`], created 2025-01-01
pub fn three_area_goals() -> Vec<GoalRecord> {
    let mut goals = Vec::new();
    for area in AREAS {
        let root = area.as_str();
        goals.push(GoalRecord::new(goal_id(root), root, ts(2025, 1, 1)));
        for second in [false, true] {
            let leaf = leaf_template(area, second);
            goals.push(
                GoalRecord::new(goal_id(&leaf), leaf.as_str(), ts(2025, 1, 1))
                    .with_parent(goal_id(root)),
            );
        }
    }
    goals
}

/// Snapshots putting every primary leaf at 80 and every secondary at 40 on `date`
pub fn eighty_forty_snapshots(date: NaiveDate) -> Vec<DailySnapshot> {
    AREAS
        .iter()
        .flat_map(|area| {
            [
                DailySnapshot::new(goal_id(&leaf_template(*area, false)), date, 80.0),
                DailySnapshot::new(goal_id(&leaf_template(*area, true)), date, 40.0),
            ]
        })
        .collect()
}

/// One snapshot per consecutive day starting at `start`
pub fn snapshot_run(goal: &str, start: NaiveDate, values: &[f64]) -> Vec<DailySnapshot> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let date = start.checked_add_days(Days::new(i as u64)).unwrap();
            DailySnapshot::new(goal, date, *v)
        })
        .collect()
}
