//! Error types for the goals service
//!
//! - [`ValidationError`]: bad user-supplied selections and preview edits,
//!   raised at the API boundary before any computation runs
//! - [`StrideError`]: umbrella over every error the engine can surface

use stride_badge::BadgeError;
use stride_graph::{ConfigError, GoalId, TemplateId};
use stride_milestone::MilestoneError;

/// Invalid user input
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// Template id not present in the goal graph
    #[error("unknown template: {0}")]
    UnknownTemplate(TemplateId),

    /// Goal id not present in the goal set
    #[error("unknown goal: {0}")]
    UnknownGoal(GoalId),

    /// The user already has a live goal for this template
    #[error("a goal for template {0} already exists")]
    DuplicateTemplate(TemplateId),

    /// Removing the goal would orphan staged children
    #[error("goal {0} still has staged children")]
    HasChildren(GoalId),

    /// Weight outside `[0, 1]` or not finite
    #[error("weight {weight} for {id} outside [0, 1]")]
    WeightOutOfRange {
        /// Goal being reweighted
        id: GoalId,
        /// Rejected weight
        weight: f64,
    },

    /// The committed goal set changed since the preview was built
    #[error("preview is stale: goal {0} is no longer in the committed set")]
    StalePreview(GoalId),
}

/// Any error produced by the Stride engine
#[derive(Debug, thiserror::Error)]
pub enum StrideError {
    /// Catalog or engine configuration is malformed
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Milestone ladder or ramp input is invalid
    #[error("milestone error: {0}")]
    Milestone(#[from] MilestoneError),

    /// Badge tier table is invalid
    #[error("badge error: {0}")]
    Badge(#[from] BadgeError),

    /// User input rejected
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
}

impl StrideError {
    /// Whether the error should be shown to the end user rather than an operator
    #[inline]
    #[must_use]
    pub fn is_user_facing(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::Milestone(_))
    }
}

/// Result type for engine operations
pub type Result<T, E = StrideError> = std::result::Result<T, E>;
