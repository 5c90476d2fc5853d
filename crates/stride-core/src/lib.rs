//! Stride Goals Service
//!
//! Orchestrates the goal progress engine on top of the template graph:
//! - [`GoalsService`]: graph, weights, config and week calendar threaded
//!   explicitly into every operation
//! - Tree assembly with bottom-up progress ([`GoalTree`])
//! - Filtering and grouping ([`FilterState`])
//! - Pacing, will gate and bottleneck analysis
//! - Phase transition detection and regression flags
//! - Staleness, auto-freeze and ISO-week grouping
//! - Weekly reviews ([`WeeklyReviewData`])
//! - Onboarding previews ([`PreviewState`]) and tree generation
//!   ([`BatchGoalInsert`])
//!
//! # Example
//!
//! ```rust,ignore
//! use stride_core::{EngineConfig, GoalsService};
//! use stride_graph::GoalGraph;
//!
//! let graph = GoalGraph::builtin()?;
//! let service = GoalsService::new(&graph, EngineConfig::default())?;
//! let tree = service.build_goal_tree(&goals, &snapshots);
//! let review = service.compute_weekly_review_data(&goals, &snapshots, today);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod activity;
mod bottleneck;
mod calendar;
mod config;
mod error;
mod filter;
mod horizon;
mod pacing;
mod preview;
mod review;
mod service;
mod transition;
mod tree;
mod tree_gen;

pub use activity::{
    get_goal_staleness, goals_to_auto_freeze, group_snapshots_into_weeks, is_daily_actionable,
    should_auto_freeze, streak_ending,
};
pub use bottleneck::{bottleneck_among, compute_bottleneck, Bottleneck};
pub use calendar::{IsoWeekCalendar, WeekCalendar};
pub use config::EngineConfig;
pub use error::{Result, StrideError, ValidationError};
pub use filter::{
    filter_goals, group_goals_by_life_area, group_goals_by_time_horizon, ArchivedFilter,
    CompletionFilter, FilterState,
};
pub use horizon::derive_time_horizon;
pub use pacing::{compute_pacing, compute_will_gate, GateReason, PacingInfo, WillGateResult};
pub use preview::{apply_preview_state, build_preview_state, AppliedPreview, PreviewState, StagedGoal};
pub use review::{GoalDelta, WeeklyReviewData};
pub use service::GoalsService;
pub use transition::{
    check_graduation_regression, detect_all_phase_transitions, detect_phase_transition,
    GraduationRegression, PhaseTransition,
};
pub use tree::{
    build_goal_tree, build_goal_tree_as_of, compute_life_area_progress, GoalNode, GoalTree,
    GoalWithProgress,
};
pub use tree_gen::{generate_goal_tree_inserts, BatchGoalInsert};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
