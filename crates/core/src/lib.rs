//! StudyMate core data models.
//!
//! This crate defines the records the study companion persists: roadmap
//! progress ledgers, reminders and quiz results, plus the report and schedule
//! shapes derived from them.

#![warn(missing_docs)]

// Core identities
mod id;

// Progress tracking
mod milestone;
mod report;

// Reminders and quizzes
mod reminder;
mod quiz;

// Planning
mod schedule;

// Re-exports
pub use id::*;

pub use milestone::{Milestone, MilestoneStatus, ParseStatusError, RoadmapProgress};
pub use report::ProgressReport;
pub use reminder::{Reminder, ReminderStatus};
pub use quiz::QuizResult;
pub use schedule::LearningSchedule;

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;

/// Calendar date type
pub type Date = chrono::NaiveDate;
