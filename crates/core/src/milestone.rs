//! Milestone model - per-roadmap progress ledger records.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use crate::Time;

/// Status of a single milestone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MilestoneStatus {
    /// Not started yet
    NotStarted,
    /// Currently being worked on
    InProgress,
    /// Finished
    Completed,
}

impl MilestoneStatus {
    /// Wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            MilestoneStatus::NotStarted => "not_started",
            MilestoneStatus::InProgress => "in_progress",
            MilestoneStatus::Completed => "completed",
        }
    }
}

impl std::fmt::Display for MilestoneStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a status string is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognised milestone status '{0}' (expected completed, in_progress or not_started)")]
pub struct ParseStatusError(pub String);

impl std::str::FromStr for MilestoneStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "not_started" => Ok(MilestoneStatus::NotStarted),
            "in_progress" => Ok(MilestoneStatus::InProgress),
            "completed" => Ok(MilestoneStatus::Completed),
            _ => Err(ParseStatusError(s.to_string())),
        }
    }
}

/// One trackable unit of progress within a roadmap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    /// Milestone name (unique within its roadmap)
    pub name: String,

    /// Current status
    pub status: MilestoneStatus,

    /// Last status write
    pub updated_at: Time,
}

/// Progress ledger for one learning roadmap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadmapProgress {
    /// Roadmap identifier
    pub roadmap_id: String,

    /// Milestones keyed by name
    pub milestones: BTreeMap<String, Milestone>,

    /// When the first milestone was recorded
    pub started_at: Time,

    /// Percentage of completed milestones (0-100)
    pub completion_percentage: f64,
}

impl RoadmapProgress {
    /// Create an empty ledger.
    pub fn new(roadmap_id: impl Into<String>, started_at: Time) -> Self {
        Self {
            roadmap_id: roadmap_id.into(),
            milestones: BTreeMap::new(),
            started_at,
            completion_percentage: 0.0,
        }
    }

    /// Insert or overwrite a milestone and refresh the completion percentage.
    pub fn upsert_milestone(&mut self, name: impl Into<String>, status: MilestoneStatus, at: Time) {
        let name = name.into();
        self.milestones.insert(
            name.clone(),
            Milestone {
                name,
                status,
                updated_at: at,
            },
        );
        self.completion_percentage = self.derived_percentage();
    }

    /// Number of milestones in the given status.
    pub fn count(&self, status: MilestoneStatus) -> usize {
        self.milestones.values().filter(|m| m.status == status).count()
    }

    /// Percentage computed from the current milestone set.
    pub fn derived_percentage(&self) -> f64 {
        let total = self.milestones.len();
        if total == 0 {
            return 0.0;
        }
        self.count(MilestoneStatus::Completed) as f64 / total as f64 * 100.0
    }

    /// Milestone names in the given status, ordered by name.
    pub fn names_with_status(&self, status: MilestoneStatus) -> Vec<String> {
        self.milestones
            .values()
            .filter(|m| m.status == status)
            .map(|m| m.name.clone())
            .collect()
    }
}
