//! Quiz result model.

use serde::{Deserialize, Serialize};
use crate::Time;

/// A scored quiz attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizResult {
    /// Quiz identifier
    pub quiz_id: String,

    /// Correct answers
    pub score: u32,

    /// Questions asked
    pub total: u32,

    /// Score as a percentage (0-100)
    pub percentage: f64,

    /// When the attempt was recorded
    pub completed_at: Time,
}

impl QuizResult {
    /// Build a result, deriving the percentage. A zero-question quiz scores 0.
    pub fn new(quiz_id: impl Into<String>, score: u32, total: u32, completed_at: Time) -> Self {
        let percentage = if total > 0 {
            score as f64 / total as f64 * 100.0
        } else {
            0.0
        };
        Self {
            quiz_id: quiz_id.into(),
            score,
            total,
            percentage,
            completed_at,
        }
    }
}
