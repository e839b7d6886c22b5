//! Study service - the ledgers wired over one store.

use std::sync::Arc;
use studymate_storage::{KeyLocks, KvStore};

use crate::{ProgressLedger, QuizLedger, ReminderRegistry};

/// Progress ledger, reminder registry and quiz ledger sharing one store and
/// one lock table, so their read-modify-write sequences never interleave on
/// the same key within this process.
#[derive(Clone)]
pub struct StudyService {
    /// Roadmap progress
    pub ledger: ProgressLedger,
    /// Reminders
    pub reminders: ReminderRegistry,
    /// Quiz results
    pub quizzes: QuizLedger,
}

impl StudyService {
    /// Wire the services over `store`.
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        let locks = Arc::new(KeyLocks::new());
        Self {
            ledger: ProgressLedger::with_locks(store.clone(), locks.clone()),
            reminders: ReminderRegistry::with_locks(store.clone(), locks),
            quizzes: QuizLedger::new(store),
        }
    }
}
