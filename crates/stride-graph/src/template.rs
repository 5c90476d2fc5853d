//! Goal template types
//!
//! Templates are immutable catalog entries. Users adopt them as goals.

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Template identifier (stable catalog slug, e.g. `approach-volume`)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateId(pub String);

impl TemplateId {
    /// Create template id
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow as string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TemplateId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Failure to parse one of the catalog enums from text
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct ParseKindError {
    /// Which enum was being parsed
    pub kind: &'static str,
    /// The rejected input
    pub value: String,
}

/// Top-level category grouping a subtree of goals
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifeArea {
    /// Meeting people and dating
    Dating,
    /// Friendships and social circle
    Social,
    /// Training, sleep, body
    Fitness,
    /// Work and income
    Career,
    /// Inner game, confidence, reflection
    Mindset,
}

impl LifeArea {
    /// All life areas in display order
    pub const ALL: [LifeArea; 5] = [
        LifeArea::Dating,
        LifeArea::Social,
        LifeArea::Fitness,
        LifeArea::Career,
        LifeArea::Mindset,
    ];

    /// Lowercase name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dating => "dating",
            Self::Social => "social",
            Self::Fitness => "fitness",
            Self::Career => "career",
            Self::Mindset => "mindset",
        }
    }
}

impl fmt::Display for LifeArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LifeArea {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Self::ALL
            .into_iter()
            .find(|area| area.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| ParseKindError {
                kind: "life area",
                value: s.to_string(),
            })
    }
}

/// Classification of a goal by distance to its target date
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeHorizon {
    /// Target within a month
    Near,
    /// Target within roughly half a year
    Mid,
    /// Anything further out
    Long,
}

impl TimeHorizon {
    /// All horizons, nearest first
    pub const ALL: [TimeHorizon; 3] = [TimeHorizon::Near, TimeHorizon::Mid, TimeHorizon::Long];

    /// Lowercase name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Near => "near",
            Self::Mid => "mid",
            Self::Long => "long",
        }
    }
}

impl fmt::Display for TimeHorizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeHorizon {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Self::ALL
            .into_iter()
            .find(|h| h.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| ParseKindError {
                kind: "time horizon",
                value: s.to_string(),
            })
    }
}

/// Structural role of a template in the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalCategory {
    /// Life-area root
    Area,
    /// Aggregate outcome built from sub-goals
    Outcome,
    /// Repeated behaviour measured by cadence
    Habit,
    /// One-off measurable target
    Milestone,
}

/// How often a goal expects an action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Cadence {
    /// Every calendar day
    Daily,
    /// Once a week on the given weekday
    Weekly {
        /// Designated weekday
        weekday: Weekday,
    },
    /// No scheduled action
    #[default]
    Unscheduled,
}

impl Cadence {
    /// Whether the cadence schedules an action on `weekday`
    #[inline]
    #[must_use]
    pub fn schedules(self, weekday: Weekday) -> bool {
        match self {
            Self::Daily => true,
            Self::Weekly { weekday: on } => on == weekday,
            Self::Unscheduled => false,
        }
    }
}

/// Maturity stage of a habit-like goal
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Building the routine
    Foundation,
    /// Routine holds, volume growing
    Momentum,
    /// Sustained without effort
    Mastery,
}

impl Phase {
    /// The stage after this one
    #[must_use]
    pub fn next(self) -> Option<Phase> {
        match self {
            Self::Foundation => Some(Self::Momentum),
            Self::Momentum => Some(Self::Mastery),
            Self::Mastery => None,
        }
    }
}

/// Sustained-threshold rule promoting a goal from one phase to the next
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GraduationRule {
    /// Phase the goal starts in
    pub from: Phase,
    /// Phase it graduates into
    pub to: Phase,
    /// Progress percentage that must be sustained
    pub threshold: f64,
}

fn default_target_value() -> f64 {
    100.0
}

/// Catalog entry describing an adoptable goal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalTemplate {
    /// Catalog id
    pub id: TemplateId,
    /// Display title
    pub title: String,
    /// Structural role
    pub category: GoalCategory,
    /// Life area the template belongs to
    pub life_area: LifeArea,
    /// Default horizon when a goal has no target date
    pub horizon: TimeHorizon,
    /// Default cadence
    #[serde(default)]
    pub cadence: Cadence,
    /// Weight among siblings
    pub default_weight: f64,
    /// Metric value that counts as 100%
    #[serde(default = "default_target_value")]
    pub target_value: f64,
    /// Optional phase promotion rule
    #[serde(default)]
    pub graduation: Option<GraduationRule>,
}

impl GoalTemplate {
    /// Create template with defaults for cadence, target and graduation
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        category: GoalCategory,
        life_area: LifeArea,
        default_weight: f64,
    ) -> Self {
        let id = TemplateId::new(id);
        Self {
            title: id.0.clone(),
            id,
            category,
            life_area,
            horizon: TimeHorizon::Mid,
            cadence: Cadence::Unscheduled,
            default_weight,
            target_value: default_target_value(),
            graduation: None,
        }
    }

    /// With cadence
    #[inline]
    #[must_use]
    pub fn with_cadence(mut self, cadence: Cadence) -> Self {
        self.cadence = cadence;
        self
    }

    /// With default horizon
    #[inline]
    #[must_use]
    pub fn with_horizon(mut self, horizon: TimeHorizon) -> Self {
        self.horizon = horizon;
        self
    }

    /// With target value
    #[inline]
    #[must_use]
    pub fn with_target(mut self, target_value: f64) -> Self {
        self.target_value = target_value;
        self
    }

    /// With graduation rule
    #[inline]
    #[must_use]
    pub fn with_graduation(mut self, rule: GraduationRule) -> Self {
        self.graduation = Some(rule);
        self
    }
}

/// Parent/child relation between two templates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalGraphEdge {
    /// Parent template
    pub parent: TemplateId,
    /// Child template
    pub child: TemplateId,
}

impl GoalGraphEdge {
    /// Create edge
    #[inline]
    #[must_use]
    pub fn new(parent: impl Into<String>, child: impl Into<String>) -> Self {
        Self {
            parent: TemplateId::new(parent),
            child: TemplateId::new(child),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn life_area_parses_case_insensitively() {
        assert_eq!("Dating".parse::<LifeArea>().unwrap(), LifeArea::Dating);
        assert_eq!(" fitness ".parse::<LifeArea>().unwrap(), LifeArea::Fitness);
        assert!("gardening".parse::<LifeArea>().is_err());
    }

    #[test]
    fn weekly_cadence_matches_only_its_day() {
        let cadence = Cadence::Weekly {
            weekday: Weekday::Fri,
        };
        assert!(cadence.schedules(Weekday::Fri));
        assert!(!cadence.schedules(Weekday::Mon));
        assert!(Cadence::Daily.schedules(Weekday::Sun));
        assert!(!Cadence::Unscheduled.schedules(Weekday::Sun));
    }

    #[test]
    fn phase_ladder_ends_at_mastery() {
        assert_eq!(Phase::Foundation.next(), Some(Phase::Momentum));
        assert_eq!(Phase::Mastery.next(), None);
    }

    #[test]
    fn cadence_deserializes_from_tagged_form() {
        let cadence: Cadence =
            serde_json::from_str(r#"{"kind":"weekly","weekday":"Sat"}"#).unwrap();
        assert_eq!(
            cadence,
            Cadence::Weekly {
                weekday: Weekday::Sat
            }
        );
    }
}
