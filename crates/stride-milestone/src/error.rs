//! Milestone errors

/// Invalid ladder or ramp input
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MilestoneError {
    /// Ladder configuration rejected
    #[error("invalid ladder config: {0}")]
    InvalidConfig(String),

    /// Ramp schedule rejected
    #[error("invalid ramp: {0}")]
    InvalidRamp(String),
}
