//! Engine configuration
//!
//! Business parameters that are deliberately not hard-coded: the staleness
//! threshold, the consecutive-day requirement for graduation, the will-gate
//! tolerance, horizon boundaries and the badge tier table. Loaded from TOML,
//! YAML or JSON; every field has a default.

use serde::{Deserialize, Serialize};
use std::path::Path;
use stride_badge::BadgeTiers;
use stride_graph::{ConfigError, DocumentFormat};

/// Tunable engine parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Days without activity after which a goal is auto-frozen
    pub staleness_threshold_days: u32,
    /// Consecutive qualifying days needed before a phase transition fires
    pub transition_min_consecutive_days: u32,
    /// Fraction of required pace a goal may fall short before it is gated
    pub will_gate_tolerance: f64,
    /// Upper bound (inclusive) in days for the near horizon
    pub near_horizon_days: i64,
    /// Upper bound (inclusive) in days for the mid horizon
    pub mid_horizon_days: i64,
    /// Badge tiers, lowest first
    pub badge_tiers: BadgeTiers,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            staleness_threshold_days: 14,
            transition_min_consecutive_days: 7,
            will_gate_tolerance: 0.1,
            near_horizon_days: 30,
            mid_horizon_days: 180,
            badge_tiers: BadgeTiers::default(),
        }
    }
}

impl EngineConfig {
    /// Load and validate a config file; format is chosen by extension
    ///
    /// # Errors
    /// I/O, parse and range errors as [`ConfigError`]
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config: Self = DocumentFormat::load(path.as_ref())?;
        config.validate()?;
        tracing::debug!(path = %path.as_ref().display(), "engine config loaded");
        Ok(config)
    }

    /// Parse and validate config text
    ///
    /// # Errors
    /// Parse and range errors as [`ConfigError`]
    pub fn from_str_as(text: &str, format: DocumentFormat) -> Result<Self, ConfigError> {
        let config: Self = format.parse(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    ///
    /// # Errors
    /// [`ConfigError::InvalidSetting`] naming the first bad field
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.staleness_threshold_days == 0 {
            return Err(ConfigError::invalid_setting(
                "staleness_threshold_days",
                "must be at least 1",
            ));
        }
        if self.transition_min_consecutive_days == 0 {
            return Err(ConfigError::invalid_setting(
                "transition_min_consecutive_days",
                "must be at least 1",
            ));
        }
        if !(0.0..1.0).contains(&self.will_gate_tolerance) {
            return Err(ConfigError::invalid_setting(
                "will_gate_tolerance",
                format!("{} outside [0, 1)", self.will_gate_tolerance),
            ));
        }
        if self.near_horizon_days < 0 {
            return Err(ConfigError::invalid_setting(
                "near_horizon_days",
                "must not be negative",
            ));
        }
        if self.mid_horizon_days <= self.near_horizon_days {
            return Err(ConfigError::invalid_setting(
                "mid_horizon_days",
                format!(
                    "{} must exceed near_horizon_days ({})",
                    self.mid_horizon_days, self.near_horizon_days
                ),
            ));
        }
        Ok(())
    }

    /// With staleness threshold
    #[inline]
    #[must_use]
    pub fn with_staleness_threshold_days(mut self, days: u32) -> Self {
        self.staleness_threshold_days = days;
        self
    }

    /// With consecutive-day requirement for transitions
    #[inline]
    #[must_use]
    pub fn with_transition_min_consecutive_days(mut self, days: u32) -> Self {
        self.transition_min_consecutive_days = days;
        self
    }

    /// With will-gate tolerance
    #[inline]
    #[must_use]
    pub fn with_will_gate_tolerance(mut self, tolerance: f64) -> Self {
        self.will_gate_tolerance = tolerance;
        self
    }

    /// With badge tiers
    #[inline]
    #[must_use]
    pub fn with_badge_tiers(mut self, tiers: BadgeTiers) -> Self {
        self.badge_tiers = tiers;
        self
    }
}
