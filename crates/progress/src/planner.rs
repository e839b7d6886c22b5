//! Learning schedule arithmetic.

use chrono::Days;
use studymate_core::{Date, LearningSchedule};

use crate::error::{require_non_empty, LedgerError, Result};

/// Build the time budget for studying `topic` from `start_date`.
pub fn create_learning_schedule(
    topic: &str,
    days_available: u32,
    hours_per_day: u32,
    start_date: Date,
) -> Result<LearningSchedule> {
    require_non_empty("topic", topic)?;
    if days_available == 0 {
        return Err(LedgerError::Validation("days_available must be positive".to_string()));
    }
    if hours_per_day == 0 || hours_per_day > 24 {
        return Err(LedgerError::Validation(format!(
            "hours_per_day must be between 1 and 24, got {}",
            hours_per_day
        )));
    }

    let total_hours = days_available
        .checked_mul(hours_per_day)
        .ok_or_else(|| LedgerError::Validation("schedule too long".to_string()))?;
    let estimated_completion = start_date
        .checked_add_days(Days::new(u64::from(days_available)))
        .ok_or_else(|| LedgerError::Validation("completion date out of range".to_string()))?;

    Ok(LearningSchedule {
        topic: topic.to_string(),
        total_duration_days: days_available,
        hours_per_day,
        total_hours,
        start_date,
        estimated_completion,
    })
}
