//! Per-user rows consumed from the persistence layer

use crate::template::TemplateId;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

/// User goal identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GoalId(pub String);

impl GoalId {
    /// Wrap an existing id
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh id (ULID, sortable by creation time)
    #[inline]
    #[must_use]
    pub fn generate() -> Self {
        Self(Ulid::new().to_string())
    }

    /// Borrow as string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GoalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GoalId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Goal row as stored by persistence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalRecord {
    /// Goal id
    pub id: GoalId,
    /// Template the goal was adopted from
    pub template_id: TemplateId,
    /// Parent goal, `None` for roots
    #[serde(default)]
    pub parent_id: Option<GoalId>,
    /// Target date, if the user set one
    #[serde(default)]
    pub target_date: Option<NaiveDate>,
    /// Last metric value written by the client. Informational only: progress,
    /// pacing and badges always read daily snapshots, and a goal without
    /// snapshots counts as 0 whatever this holds.
    #[serde(default)]
    pub current_value: f64,
    /// Per-goal target override; falls back to the template target
    #[serde(default)]
    pub target_value: Option<f64>,
    /// Adoption time
    pub created_at: DateTime<Utc>,
    /// Last user update
    pub last_updated_at: DateTime<Utc>,
    /// Retired by the user
    #[serde(default)]
    pub archived: bool,
    /// Paused (manually or by staleness)
    #[serde(default)]
    pub frozen: bool,
}

impl GoalRecord {
    /// Create an active root goal created and updated at `created_at`
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        template_id: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: GoalId::new(id),
            template_id: TemplateId::new(template_id),
            parent_id: None,
            target_date: None,
            current_value: 0.0,
            target_value: None,
            created_at,
            last_updated_at: created_at,
            archived: false,
            frozen: false,
        }
    }

    /// With parent goal
    #[inline]
    #[must_use]
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent_id = Some(GoalId::new(parent));
        self
    }

    /// With target date
    #[inline]
    #[must_use]
    pub fn with_target_date(mut self, date: NaiveDate) -> Self {
        self.target_date = Some(date);
        self
    }

    /// With target value override
    #[inline]
    #[must_use]
    pub fn with_target_value(mut self, value: f64) -> Self {
        self.target_value = Some(value);
        self
    }

    /// With current value
    #[inline]
    #[must_use]
    pub fn with_current_value(mut self, value: f64) -> Self {
        self.current_value = value;
        self
    }

    /// Mark archived
    #[inline]
    #[must_use]
    pub fn archived(mut self) -> Self {
        self.archived = true;
        self
    }

    /// Mark frozen
    #[inline]
    #[must_use]
    pub fn frozen(mut self) -> Self {
        self.frozen = true;
        self
    }
}

/// End-of-day metric value of a goal. One per (goal, date), never rewritten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySnapshot {
    /// Goal the value belongs to
    pub goal_id: GoalId,
    /// Calendar day
    pub date: NaiveDate,
    /// Cumulative metric value at end of day
    pub value: f64,
}

impl DailySnapshot {
    /// Create snapshot
    #[inline]
    #[must_use]
    pub fn new(goal_id: impl Into<String>, date: NaiveDate, value: f64) -> Self {
        Self {
            goal_id: GoalId::new(goal_id),
            date,
            value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn generated_ids_are_unique() {
        assert_ne!(GoalId::generate(), GoalId::generate());
    }

    #[test]
    fn goal_record_reads_camel_case_rows() {
        let json = r#"{
            "id": "g1",
            "templateId": "approach-volume",
            "parentId": "g0",
            "targetDate": "2025-03-01",
            "currentValue": 12.0,
            "createdAt": "2025-01-01T00:00:00Z",
            "lastUpdatedAt": "2025-01-05T10:00:00Z"
        }"#;
        let record: GoalRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.parent_id, Some(GoalId::new("g0")));
        assert_eq!(record.target_value, None);
        assert!(!record.archived);
        assert_eq!(
            record.created_at,
            Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
        );
    }
}
