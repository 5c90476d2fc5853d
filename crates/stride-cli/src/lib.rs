//! Stride CLI support
//!
//! Input loading and the command bodies behind the `stride` binary. Every
//! command returns a serializable report; printing stays in `main`.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use stride_core::{
    filter_goals, EngineConfig, FilterState, GoalWithProgress, GoalsService, PacingInfo,
    WillGateResult,
};
use stride_graph::{DailySnapshot, GoalGraph, GoalId, GoalRecord};
use stride_milestone::{
    compute_ramp_milestone_dates, generate_milestone_ladder, CurvePreset, HabitRampStep,
    MilestoneLadderConfig, RampMilestone,
};

/// Curve preset names accepted on the command line
pub const CURVE_NAMES: [&str; 3] = ["linear", "ease-in", "ease-out"];

/// Goal graph from a catalog file, or the built-in catalog
///
/// # Errors
/// Unreadable or invalid catalog
pub fn load_graph(catalog: Option<&Path>) -> Result<GoalGraph> {
    match catalog {
        Some(path) => {
            let catalog = stride_graph::GoalCatalog::from_path(path)
                .with_context(|| format!("loading catalog {}", path.display()))?;
            GoalGraph::from_catalog(catalog)
                .with_context(|| format!("building goal graph from {}", path.display()))
        }
        None => GoalGraph::builtin().context("loading built-in catalog"),
    }
}

/// Engine config from a file, or the defaults
///
/// # Errors
/// Unreadable or out-of-range config
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::from_path(path)
            .with_context(|| format!("loading engine config {}", path.display())),
        None => Ok(EngineConfig::default()),
    }
}

/// Deserialize a JSON document
///
/// # Errors
/// I/O or parse failure, with the path attached
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

/// Parse a curve preset name
///
/// # Errors
/// Names outside [`CURVE_NAMES`]
pub fn parse_curve(name: &str) -> Result<CurvePreset> {
    match name {
        "linear" => Ok(CurvePreset::Linear),
        "ease-in" => Ok(CurvePreset::EaseIn),
        "ease-out" => Ok(CurvePreset::EaseOut),
        other => bail!("unknown curve {other:?}, expected one of {CURVE_NAMES:?}"),
    }
}

/// Parse a ramp step written as `DAYS:DELTA`, e.g. `7:2.5`
///
/// # Errors
/// Missing separator or unparsable numbers
pub fn parse_ramp_step(text: &str) -> Result<HabitRampStep> {
    let Some((days, delta)) = text.split_once(':') else {
        bail!("ramp step {text:?} is not DAYS:DELTA");
    };
    let days: u32 = days
        .trim()
        .parse()
        .with_context(|| format!("ramp step {text:?}: bad day count"))?;
    let delta: f64 = delta
        .trim()
        .parse()
        .with_context(|| format!("ramp step {text:?}: bad target delta"))?;
    Ok(HabitRampStep::new(days, delta))
}

/// Shape of a loaded catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSummary {
    /// Template count
    pub templates: usize,
    /// Root templates
    pub roots: Vec<String>,
    /// Leaf template count
    pub leaves: usize,
}

/// Summarize a graph that passed validation
#[must_use]
pub fn summarize_graph(graph: &GoalGraph) -> CatalogSummary {
    CatalogSummary {
        templates: graph.len(),
        roots: graph.roots().iter().map(|r| r.as_str().to_string()).collect(),
        leaves: graph.leaf_goals().len(),
    }
}

/// Milestone ladder from `start` to `target`
///
/// # Errors
/// Invalid ladder parameters
pub fn run_ladder(start: f64, target: f64, rungs: usize, curve: CurvePreset) -> Result<Vec<f64>> {
    let config = MilestoneLadderConfig::new(start, target, rungs).with_preset(curve);
    generate_milestone_ladder(&config).context("generating milestone ladder")
}

/// Ramp milestone dates from `start`
///
/// # Errors
/// Invalid ramp steps
pub fn run_ramp(steps: &[HabitRampStep], start: NaiveDate) -> Result<Vec<RampMilestone>> {
    compute_ramp_milestone_dates(steps, start).context("computing ramp milestones")
}

/// Goals and snapshots read from JSON files
#[derive(Debug, Clone, Default)]
pub struct GoalData {
    /// Goal rows
    pub goals: Vec<GoalRecord>,
    /// Snapshot rows
    pub snapshots: Vec<DailySnapshot>,
}

impl GoalData {
    /// Read both files; a missing snapshot file means no snapshots
    ///
    /// # Errors
    /// I/O or parse failure
    pub fn load(goals: &Path, snapshots: Option<&Path>) -> Result<Self> {
        let goals: Vec<GoalRecord> = read_json(goals)?;
        let snapshots: Vec<DailySnapshot> = match snapshots {
            Some(path) => read_json(path)?,
            None => Vec::new(),
        };
        tracing::debug!(
            goals = goals.len(),
            snapshots = snapshots.len(),
            "goal data loaded"
        );
        Ok(Self { goals, snapshots })
    }
}

/// Goals of the tree as of `date` that pass the `key=value` filters
///
/// # Errors
/// Filters without `=`
pub fn run_tree(
    service: &GoalsService<'_>,
    data: &GoalData,
    date: NaiveDate,
    filters: &[String],
) -> Result<Vec<GoalWithProgress>> {
    let mut params = Vec::with_capacity(filters.len());
    for filter in filters {
        let Some(pair) = filter.split_once('=') else {
            bail!("filter {filter:?} is not KEY=VALUE");
        };
        params.push(pair);
    }
    let state = FilterState::from_params(params);
    let tree = service.build_goal_tree_as_of(&data.goals, &data.snapshots, date);
    Ok(filter_goals(tree.goals(), &state)
        .into_iter()
        .cloned()
        .collect())
}

/// Pace and will gate of one goal
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PacingReport {
    /// Pace figures
    pub pacing: PacingInfo,
    /// Gate decision
    pub will_gate: WillGateResult,
}

/// Pacing report for `goal` on `date`
///
/// # Errors
/// Goal id not present in `data`
pub fn run_pacing(
    service: &GoalsService<'_>,
    data: &GoalData,
    goal: &GoalId,
    date: NaiveDate,
) -> Result<PacingReport> {
    let record = data
        .goals
        .iter()
        .find(|g| &g.id == goal)
        .with_context(|| format!("no goal {goal}"))?;
    let pacing = service.compute_pacing(record, &data.snapshots, date);
    let will_gate = service.compute_will_gate(record, &pacing);
    Ok(PacingReport { pacing, will_gate })
}

/// Goals due for auto-freeze on `date`
#[must_use]
pub fn run_freeze(service: &GoalsService<'_>, data: &GoalData, date: NaiveDate) -> Vec<GoalId> {
    let tree = service.build_goal_tree_as_of(&data.goals, &data.snapshots, date);
    service.goals_to_auto_freeze(&tree, date)
}

/// Today's date in UTC
#[must_use]
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
