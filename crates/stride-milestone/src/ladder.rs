//! Milestone ladder generation

use crate::curve::{apply_curve, CurveControlPoint, CurvePreset};
use crate::error::MilestoneError;
use crate::nice::{next_nice_number, round_to_nice_number};
use serde::{Deserialize, Serialize};

/// Input for [`generate_milestone_ladder`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MilestoneLadderConfig {
    /// Value the user starts from
    pub start: f64,
    /// Value of the final goal
    pub target: f64,
    /// Number of rungs to produce
    pub rung_count: usize,
    /// Curve shaping rung placement
    pub control_points: Vec<CurveControlPoint>,
}

impl MilestoneLadderConfig {
    /// Linear ladder from `start` to `target`
    #[inline]
    #[must_use]
    pub fn new(start: f64, target: f64, rung_count: usize) -> Self {
        Self {
            start,
            target,
            rung_count,
            control_points: CurvePreset::Linear.points(),
        }
    }

    /// With curve preset
    #[inline]
    #[must_use]
    pub fn with_preset(mut self, preset: CurvePreset) -> Self {
        self.control_points = preset.points();
        self
    }

    /// With explicit control points
    #[inline]
    #[must_use]
    pub fn with_points(mut self, points: Vec<CurveControlPoint>) -> Self {
        self.control_points = points;
        self
    }

    /// Check the configuration
    ///
    /// # Errors
    /// [`MilestoneError::InvalidConfig`] describing the first problem found
    pub fn validate(&self) -> Result<(), MilestoneError> {
        let invalid = |msg: &str| Err(MilestoneError::InvalidConfig(msg.to_string()));
        if self.rung_count == 0 {
            return invalid("rung count must be at least 1");
        }
        if !self.start.is_finite() || !self.target.is_finite() {
            return invalid("start and target must be finite");
        }
        if self.start < 0.0 {
            return invalid("start must not be negative");
        }
        if self.target <= self.start {
            return invalid("target must exceed start");
        }
        if self.control_points.len() < 2 {
            return invalid("curve needs at least two control points");
        }
        for p in &self.control_points {
            if !(0.0..=1.0).contains(&p.t) {
                return invalid("control point t outside [0, 1]");
            }
        }
        for pair in self.control_points.windows(2) {
            if pair[1].t <= pair[0].t {
                return invalid("control point t must be strictly increasing");
            }
            if pair[1].value < pair[0].value {
                return invalid("curve must be non-decreasing");
            }
        }
        Ok(())
    }
}

/// Produce `rung_count` strictly increasing milestone values.
///
/// Rung `i` sits at `t = i / rung_count` and the last rung is the target
/// itself. Each intermediate raw value is snapped to a nice number. A rung must
/// land strictly between the previous rung (or the start value) and the target;
/// when the snapped value does not, the next nice number above the previous
/// rung is tried, then the raw curve value, then an even split of the
/// remaining span.
///
/// # Errors
/// [`MilestoneError::InvalidConfig`] if the configuration does not validate
pub fn generate_milestone_ladder(config: &MilestoneLadderConfig) -> Result<Vec<f64>, MilestoneError> {
    config.validate()?;

    let span = config.target - config.start;
    #[allow(clippy::cast_precision_loss)]
    let rungs = config.rung_count as f64;

    let mut ladder = Vec::with_capacity(config.rung_count);
    let mut previous = config.start;
    for i in 1..config.rung_count {
        #[allow(clippy::cast_precision_loss)]
        let t = i as f64 / rungs;
        let raw = config.start + apply_curve(t, &config.control_points) * span;
        let fits = |v: f64| v > previous && v < config.target;
        #[allow(clippy::cast_precision_loss)]
        let left = (config.rung_count - i + 1) as f64;
        let value = [round_to_nice_number(raw), next_nice_number(previous), raw]
            .into_iter()
            .find(|v| fits(*v))
            .unwrap_or_else(|| previous + (config.target - previous) / left);
        ladder.push(value);
        previous = value;
    }
    ladder.push(config.target);

    tracing::debug!(
        rungs = ladder.len(),
        first = ladder.first().copied().unwrap_or_default(),
        last = config.target,
        "milestone ladder generated"
    );
    Ok(ladder)
}
