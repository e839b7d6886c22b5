//! Progress report - bucketed view of a roadmap ledger.

use serde::{Deserialize, Serialize};
use crate::milestone::{MilestoneStatus, RoadmapProgress};
use crate::Time;

/// Progress report for a learning roadmap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressReport {
    /// Roadmap identifier
    pub roadmap_id: String,

    /// Total milestones recorded
    pub total_milestones: usize,

    /// Completed count
    pub completed: usize,

    /// In-progress count
    pub in_progress: usize,

    /// Not-started count
    pub not_started: usize,

    /// Completion percentage (0-100)
    pub completion_percentage: f64,

    /// When tracking started
    pub started_at: Time,

    /// Completed milestone names, ordered by name
    pub completed_milestones: Vec<String>,

    /// In-progress milestone names, ordered by name
    pub current_milestones: Vec<String>,

    /// Not-started milestone names, ordered by name
    pub upcoming_milestones: Vec<String>,
}

impl From<&RoadmapProgress> for ProgressReport {
    fn from(progress: &RoadmapProgress) -> Self {
        let completed_milestones = progress.names_with_status(MilestoneStatus::Completed);
        let current_milestones = progress.names_with_status(MilestoneStatus::InProgress);
        let upcoming_milestones = progress.names_with_status(MilestoneStatus::NotStarted);

        Self {
            roadmap_id: progress.roadmap_id.clone(),
            total_milestones: progress.milestones.len(),
            completed: completed_milestones.len(),
            in_progress: current_milestones.len(),
            not_started: upcoming_milestones.len(),
            completion_percentage: progress.derived_percentage(),
            started_at: progress.started_at,
            completed_milestones,
            current_milestones,
            upcoming_milestones,
        }
    }
}
