//! Habit ramp scheduling

use crate::error::MilestoneError;
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// One step of a ramp-up plan: hold for `duration_days`, then raise the bar
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitRampStep {
    /// Length of the step in days
    pub duration_days: u32,
    /// Increase of the daily target at the end of the step
    pub target_delta: f64,
}

impl HabitRampStep {
    /// Create ramp step
    #[inline]
    #[must_use]
    pub const fn new(duration_days: u32, target_delta: f64) -> Self {
        Self {
            duration_days,
            target_delta,
        }
    }
}

/// Calendar boundary of a ramp step
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RampMilestone {
    /// Zero-based step index
    pub step: usize,
    /// Day the step ends
    pub date: NaiveDate,
    /// Cumulative target reached at `date`
    pub target: f64,
}

/// Walk the ramp in order, one milestone per step boundary.
///
/// # Errors
/// [`MilestoneError::InvalidRamp`] for non-finite deltas or dates past the
/// calendar range
pub fn compute_ramp_milestone_dates(
    ramp: &[HabitRampStep],
    start_date: NaiveDate,
) -> Result<Vec<RampMilestone>, MilestoneError> {
    let mut date = start_date;
    let mut target = 0.0;
    let mut out = Vec::with_capacity(ramp.len());
    for (step, entry) in ramp.iter().enumerate() {
        if !entry.target_delta.is_finite() {
            return Err(MilestoneError::InvalidRamp(format!(
                "step {step} has a non-finite target delta"
            )));
        }
        date = date
            .checked_add_days(Days::new(u64::from(entry.duration_days)))
            .ok_or_else(|| MilestoneError::InvalidRamp(format!("step {step} ends past the calendar range")))?;
        target += entry.target_delta;
        out.push(RampMilestone { step, date, target });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn accumulates_durations_and_targets() {
        let ramp = [
            HabitRampStep::new(7, 1.0),
            HabitRampStep::new(14, 2.0),
            HabitRampStep::new(10, 2.0),
        ];
        let out = compute_ramp_milestone_dates(&ramp, day(2025, 1, 1)).unwrap();
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].date, day(2025, 1, 8));
        assert_eq!(out[1].date, day(2025, 1, 22));
        assert_eq!(out[2].date, day(2025, 2, 1));
        assert_eq!(out[2].target, 5.0);
    }

    #[test]
    fn empty_ramp_has_no_milestones() {
        assert!(compute_ramp_milestone_dates(&[], day(2025, 1, 1)).unwrap().is_empty());
    }

    #[test]
    fn rejects_nan_delta() {
        let ramp = [HabitRampStep::new(3, f64::NAN)];
        assert!(compute_ramp_milestone_dates(&ramp, day(2025, 1, 1)).is_err());
    }
}
