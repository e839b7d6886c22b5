//! Quiz results ledger.

use chrono::Utc;
use std::sync::Arc;
use studymate_core::QuizResult;
use studymate_storage::KvStore;
use tracing::info;

use crate::codec;
use crate::error::{require_non_empty, LedgerError, Result};

/// Stores one result per quiz id; resaving overwrites.
#[derive(Clone)]
pub struct QuizLedger {
    store: Arc<dyn KvStore>,
}

impl QuizLedger {
    /// Create a quiz ledger.
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Record a scored attempt.
    pub async fn save_results(&self, quiz_id: &str, score: u32, total: u32) -> Result<QuizResult> {
        require_non_empty("quiz_id", quiz_id)?;
        if score > total {
            return Err(LedgerError::Validation(format!(
                "score {} exceeds total {}",
                score, total
            )));
        }

        let result = QuizResult::new(quiz_id, score, total, Utc::now());
        let key = codec::quiz_results_key(quiz_id);
        self.store.set(&key, &codec::encode(&key, &result)?).await?;
        info!("Saved quiz {} result {}/{}", quiz_id, score, total);
        Ok(result)
    }

    /// Load a saved result, failing with `NotFound` when absent.
    pub async fn get_results(&self, quiz_id: &str) -> Result<QuizResult> {
        let key = codec::quiz_results_key(quiz_id);
        let raw = self
            .store
            .get(&key)
            .await?
            .ok_or_else(|| LedgerError::NotFound(format!("no results for quiz '{}'", quiz_id)))?;
        let result: QuizResult = codec::decode(&key, &raw)?;
        if result.quiz_id != quiz_id || result.score > result.total {
            return Err(LedgerError::schema(&key, "inconsistent quiz result"));
        }
        Ok(result)
    }
}
