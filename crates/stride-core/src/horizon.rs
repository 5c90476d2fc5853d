//! Time horizon classification

use crate::config::EngineConfig;
use chrono::NaiveDate;
use stride_graph::TimeHorizon;

/// Classify a goal by days from `today` to its target date.
///
/// `≤ near_horizon_days` is near, `≤ mid_horizon_days` is mid, anything later
/// is long. Overdue targets are near. Without a target date the template's
/// horizon class (`fallback`) applies.
#[must_use]
pub fn derive_time_horizon(
    target_date: Option<NaiveDate>,
    fallback: TimeHorizon,
    today: NaiveDate,
    config: &EngineConfig,
) -> TimeHorizon {
    let Some(target) = target_date else {
        return fallback;
    };
    let days = (target - today).num_days();
    if days <= config.near_horizon_days {
        TimeHorizon::Near
    } else if days <= config.mid_horizon_days {
        TimeHorizon::Mid
    } else {
        TimeHorizon::Long
    }
}
