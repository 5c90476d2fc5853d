//! Badge tier table

use serde::{Deserialize, Serialize};

/// Invalid tier table
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BadgeError {
    /// No tiers given
    #[error("badge tier table is empty")]
    Empty,

    /// Lowest tier does not start at zero
    #[error("lowest tier {name} starts at {min_progress}, expected 0")]
    NonZeroFloor {
        /// Tier name
        name: String,
        /// Its threshold
        min_progress: f64,
    },

    /// Thresholds are not strictly increasing
    #[error("tier {name} threshold {min_progress} does not exceed the previous tier")]
    NotIncreasing {
        /// Tier name
        name: String,
        /// Its threshold
        min_progress: f64,
    },
}

/// Named tier unlocked at `min_progress`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BadgeTier {
    /// Display name
    pub name: String,
    /// Minimum progress percentage
    pub min_progress: f64,
}

impl BadgeTier {
    /// Create tier
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, min_progress: f64) -> Self {
        Self {
            name: name.into(),
            min_progress,
        }
    }
}

/// Validated tier table: non-empty, first threshold 0, strictly increasing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<BadgeTier>", into = "Vec<BadgeTier>")]
pub struct BadgeTiers {
    tiers: Vec<BadgeTier>,
}

impl BadgeTiers {
    /// Validate and wrap a tier list
    ///
    /// # Errors
    /// [`BadgeError`] if the list is empty, does not start at 0, or is not
    /// strictly increasing
    pub fn new(tiers: Vec<BadgeTier>) -> Result<Self, BadgeError> {
        let first = tiers.first().ok_or(BadgeError::Empty)?;
        if first.min_progress != 0.0 {
            return Err(BadgeError::NonZeroFloor {
                name: first.name.clone(),
                min_progress: first.min_progress,
            });
        }
        for pair in tiers.windows(2) {
            if pair[1].min_progress.is_nan() || pair[1].min_progress <= pair[0].min_progress {
                return Err(BadgeError::NotIncreasing {
                    name: pair[1].name.clone(),
                    min_progress: pair[1].min_progress,
                });
            }
        }
        Ok(Self { tiers })
    }

    /// Lowest tier
    #[inline]
    #[must_use]
    pub fn lowest(&self) -> &BadgeTier {
        &self.tiers[0]
    }

    /// Tiers in ascending order
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[BadgeTier] {
        &self.tiers
    }

    /// Position of the tier named `name`
    #[must_use]
    pub fn rank_of(&self, name: &str) -> Option<usize> {
        self.tiers.iter().position(|t| t.name == name)
    }
}

impl Default for BadgeTiers {
    fn default() -> Self {
        Self {
            tiers: vec![
                BadgeTier::new("Starter", 0.0),
                BadgeTier::new("Bronze", 25.0),
                BadgeTier::new("Silver", 50.0),
                BadgeTier::new("Gold", 75.0),
                BadgeTier::new("Platinum", 100.0),
            ],
        }
    }
}

impl TryFrom<Vec<BadgeTier>> for BadgeTiers {
    type Error = BadgeError;

    fn try_from(value: Vec<BadgeTier>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<BadgeTiers> for Vec<BadgeTier> {
    fn from(value: BadgeTiers) -> Self {
        value.tiers
    }
}

/// Tier with the greatest threshold not above `progress`.
///
/// Absent, NaN or negative progress clamps to the lowest tier.
#[must_use]
pub fn progress_to_tier(progress: Option<f64>, tiers: &BadgeTiers) -> &BadgeTier {
    let Some(progress) = progress.filter(|p| !p.is_nan()) else {
        return tiers.lowest();
    };
    tiers
        .as_slice()
        .iter()
        .rev()
        .find(|t| t.min_progress <= progress)
        .unwrap_or_else(|| tiers.lowest())
}
