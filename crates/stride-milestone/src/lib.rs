//! Stride Milestone Service
//!
//! Curve-based milestone ladders, habit ramp schedules and the weighted
//! achievement score over the template graph.
//!
//! # Core Concepts
//!
//! - [`apply_curve`]: piecewise-linear interpolation over [`CurveControlPoint`]s
//! - [`round_to_nice_number`]: snaps values to `{1, 2, 5} × 10^k`
//! - [`generate_milestone_ladder`]: strictly increasing rung values
//! - [`compute_ramp_milestone_dates`]: calendar dates for ramp-up steps
//! - [`compute_achievement_progress`]: bottom-up weighted score in `[0, 100]`

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod achievement;
mod curve;
mod error;
mod ladder;
mod nice;
mod ramp;

pub use achievement::{compute_achievement_progress, latest_snapshots, leaf_progress};
pub use curve::{apply_curve, CurveControlPoint, CurvePreset};
pub use error::MilestoneError;
pub use ladder::{generate_milestone_ladder, MilestoneLadderConfig};
pub use nice::{next_nice_number, round_to_nice_number};
pub use ramp::{compute_ramp_milestone_dates, HabitRampStep, RampMilestone};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
