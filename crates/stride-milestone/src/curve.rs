//! Interpolation curves for milestone placement

use serde::{Deserialize, Serialize};

/// Point on a progress curve.
///
/// `t` is the normalized rung position in `[0, 1]`; `value` is the fraction
/// of the start→target span reached at that position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveControlPoint {
    /// Normalized position
    pub t: f64,
    /// Fraction of the span
    pub value: f64,
}

impl CurveControlPoint {
    /// Create control point
    #[inline]
    #[must_use]
    pub const fn new(t: f64, value: f64) -> Self {
        Self { t, value }
    }
}

/// Named curve shapes offered to users
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CurvePreset {
    /// Evenly spaced rungs
    #[default]
    Linear,
    /// Small early steps, bigger jumps later
    EaseIn,
    /// Big early steps, fine-grained near the target
    EaseOut,
}

impl CurvePreset {
    /// Control points of the preset
    #[must_use]
    pub fn points(self) -> Vec<CurveControlPoint> {
        match self {
            Self::Linear => vec![CurveControlPoint::new(0.0, 0.0), CurveControlPoint::new(1.0, 1.0)],
            Self::EaseIn => vec![
                CurveControlPoint::new(0.0, 0.0),
                CurveControlPoint::new(0.5, 0.2),
                CurveControlPoint::new(0.8, 0.5),
                CurveControlPoint::new(1.0, 1.0),
            ],
            Self::EaseOut => vec![
                CurveControlPoint::new(0.0, 0.0),
                CurveControlPoint::new(0.2, 0.5),
                CurveControlPoint::new(0.5, 0.8),
                CurveControlPoint::new(1.0, 1.0),
            ],
        }
    }
}

/// Interpolate the curve at `t`.
///
/// Points must be sorted by strictly increasing `t`. Positions outside the
/// first/last point clamp to the end values. An empty curve is the identity.
#[must_use]
pub fn apply_curve(t: f64, points: &[CurveControlPoint]) -> f64 {
    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        return t;
    };
    if t <= first.t {
        return first.value;
    }
    if t >= last.t {
        return last.value;
    }
    for pair in points.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if t <= b.t {
            let span = b.t - a.t;
            let frac = if span > 0.0 { (t - a.t) / span } else { 1.0 };
            return a.value + frac * (b.value - a.value);
        }
    }
    last.value
}
