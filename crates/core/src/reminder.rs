//! Reminder model - scheduled study notifications.

use serde::{Deserialize, Serialize};
use crate::id::ReminderId;
use crate::{Date, Time};

/// A scheduled study reminder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reminder {
    /// Unique identifier
    pub reminder_id: ReminderId,

    /// Reminder text
    pub message: String,

    /// Day the reminder is due
    pub scheduled_date: Date,

    /// When created
    pub created_at: Time,

    /// Lifecycle status
    pub status: ReminderStatus,
}

impl Reminder {
    /// Create a new scheduled reminder.
    pub fn new(reminder_id: ReminderId, message: impl Into<String>, scheduled_date: Date) -> Self {
        Self {
            reminder_id,
            message: message.into(),
            scheduled_date,
            created_at: chrono::Utc::now(),
            status: ReminderStatus::Scheduled,
        }
    }

    /// Whether the reminder is still scheduled and due on or before `today`.
    pub fn is_due(&self, today: Date) -> bool {
        self.status == ReminderStatus::Scheduled && self.scheduled_date <= today
    }
}

/// Reminder status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderStatus {
    /// Waiting for its date
    Scheduled,
    /// Delivered
    Fired,
    /// Cancelled before delivery
    Cancelled,
}

impl ReminderStatus {
    /// Wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReminderStatus::Scheduled => "scheduled",
            ReminderStatus::Fired => "fired",
            ReminderStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for ReminderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
