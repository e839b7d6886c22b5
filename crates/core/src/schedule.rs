//! Learning schedule - time budget for studying a topic.

use serde::{Deserialize, Serialize};
use crate::Date;

/// Time budget for a topic over a fixed number of days.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearningSchedule {
    /// Topic being studied
    pub topic: String,

    /// Days available
    pub total_duration_days: u32,

    /// Study hours per day
    pub hours_per_day: u32,

    /// Total study hours
    pub total_hours: u32,

    /// First study day
    pub start_date: Date,

    /// Expected finishing day
    pub estimated_completion: Date,
}
