//! Configuration errors
//!
//! Raised while loading the goal catalog or engine settings. These are fatal
//! at startup and never produced by per-request computation.

use crate::template::{Phase, TemplateId};
use std::path::PathBuf;

/// Malformed catalog, graph or engine configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Two templates share an id
    #[error("duplicate template id: {0}")]
    DuplicateTemplate(TemplateId),

    /// An edge names a template that is not in the catalog
    #[error("edge references unknown template: {0}")]
    UnknownTemplate(TemplateId),

    /// An edge connects a template to itself
    #[error("template {0} lists itself as a child")]
    SelfEdge(TemplateId),

    /// A template has more than one parent
    #[error("template {child} has more than one parent ({first}, {second})")]
    MultipleParents {
        /// The child template
        child: TemplateId,
        /// Parent seen first
        first: TemplateId,
        /// Conflicting parent
        second: TemplateId,
    },

    /// The edge set contains a cycle
    #[error("cycle in goal graph: {path:?}")]
    Cycle {
        /// Templates on the cycle, in traversal order
        path: Vec<TemplateId>,
    },

    /// A default weight lies outside `[0, 1]`
    #[error("default weight {weight} of {id} outside [0, 1]")]
    WeightOutOfRange {
        /// Offending template
        id: TemplateId,
        /// Its weight
        weight: f64,
    },

    /// A graduation rule does not lead to the next phase
    #[error("graduation of {id} goes from {from:?} to {to:?}, not the next phase")]
    PhaseSkip {
        /// Offending template
        id: TemplateId,
        /// Starting phase
        from: Phase,
        /// Target phase
        to: Phase,
    },

    /// Sibling default weights do not sum to 1
    #[error("weights under {parent} sum to {sum}, expected 1")]
    UnbalancedWeights {
        /// Parent template id, or `<root>` for the root group
        parent: String,
        /// Actual sum
        sum: f64,
    },

    /// The document could not be parsed
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    /// Unsupported file extension
    #[error("unsupported config format: {0}")]
    UnsupportedFormat(String),

    /// A setting is out of range
    #[error("invalid setting {field}: {reason}")]
    InvalidSetting {
        /// Setting name
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },

    /// The file could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    /// Create an invalid-setting error
    #[inline]
    pub fn invalid_setting(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidSetting {
            field,
            reason: reason.into(),
        }
    }

    /// Check if the error comes from the graph structure itself
    #[inline]
    #[must_use]
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::DuplicateTemplate(_)
                | Self::UnknownTemplate(_)
                | Self::SelfEdge(_)
                | Self::MultipleParents { .. }
                | Self::Cycle { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = ConfigError::UnknownTemplate(TemplateId::new("ghost"));
        assert!(err.to_string().contains("unknown template: ghost"));
    }

    #[test]
    fn structural_classification() {
        assert!(ConfigError::SelfEdge(TemplateId::new("a")).is_structural());
        assert!(!ConfigError::invalid_setting("k", "zero").is_structural());
    }
}
