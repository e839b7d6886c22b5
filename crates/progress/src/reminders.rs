//! Reminder registry.
//!
//! Each reminder is stored under its own key and its id is appended to the
//! global index. The record write and the index append are separate store
//! operations: when the append fails the reminder exists but is not listed.

use std::sync::Arc;
use studymate_core::{Date, Reminder, ReminderId, ReminderIdGenerator, ReminderStatus};
use studymate_storage::{KeyLocks, KvStore};
use tracing::{debug, info, warn};

use crate::codec::{self, ReminderIndex, REMINDER_INDEX_KEY};
use crate::error::{require_non_empty, LedgerError, Result};

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(s: &str) -> Result<Date> {
    Date::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| LedgerError::Validation(format!("invalid date '{}' (expected YYYY-MM-DD): {}", s, e)))
}

/// Scheduled study reminders over a key-value store.
#[derive(Clone)]
pub struct ReminderRegistry {
    store: Arc<dyn KvStore>,
    locks: Arc<KeyLocks>,
    ids: Arc<ReminderIdGenerator>,
}

impl ReminderRegistry {
    /// Create a registry with its own lock table.
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self::with_locks(store, Arc::new(KeyLocks::new()))
    }

    /// Create a registry sharing `locks` with other writers of the same store.
    pub fn with_locks(store: Arc<dyn KvStore>, locks: Arc<KeyLocks>) -> Self {
        Self {
            store,
            locks,
            ids: Arc::new(ReminderIdGenerator::new()),
        }
    }

    /// Schedule a reminder. Past dates are accepted and are due immediately.
    ///
    /// Fails only when the reminder record cannot be written; a failed index
    /// append is logged and the reminder is still returned.
    pub async fn schedule_reminder(&self, message: &str, date: Date) -> Result<Reminder> {
        require_non_empty("message", message)?;

        let reminder = Reminder::new(self.ids.next_id(), message, date);
        let key = codec::reminder_key(&reminder.reminder_id);
        self.store.set(&key, &codec::encode(&key, &reminder)?).await?;

        if let Err(e) = self.append_to_index(reminder.reminder_id).await {
            warn!(
                "Reminder {} stored but not indexed: {}",
                reminder.reminder_id, e
            );
        } else {
            info!("Scheduled reminder {} for {}", reminder.reminder_id, date);
        }
        Ok(reminder)
    }

    /// Every indexed reminder, in scheduling order.
    ///
    /// Ids whose record is missing from the store are skipped.
    pub async fn list_reminders(&self) -> Result<Vec<Reminder>> {
        let index = self.load_index().await?;
        let mut reminders = Vec::with_capacity(index.reminder_ids.len());
        for id in index.reminder_ids {
            match self.load(id).await? {
                Some(reminder) => reminders.push(reminder),
                None => debug!("Skipping indexed reminder {} with no record", id),
            }
        }
        Ok(reminders)
    }

    /// Load one reminder, failing with `NotFound` when absent.
    pub async fn get_reminder(&self, id: ReminderId) -> Result<Reminder> {
        self.load(id)
            .await?
            .ok_or_else(|| LedgerError::NotFound(format!("no reminder with id {}", id)))
    }

    /// Cancel a scheduled reminder.
    pub async fn cancel_reminder(&self, id: ReminderId) -> Result<Reminder> {
        let key = codec::reminder_key(&id);
        let _guard = self.locks.lock(&key).await;

        let mut reminder = self.get_reminder(id).await?;
        if reminder.status != ReminderStatus::Scheduled {
            return Err(LedgerError::Validation(format!(
                "reminder {} is already {}",
                id, reminder.status
            )));
        }
        reminder.status = ReminderStatus::Cancelled;
        self.store.set(&key, &codec::encode(&key, &reminder)?).await?;
        info!("Cancelled reminder {}", id);
        Ok(reminder)
    }

    /// Mark every scheduled reminder due on or before `today` as fired and
    /// return them.
    pub async fn fire_due(&self, today: Date) -> Result<Vec<Reminder>> {
        let mut fired = Vec::new();
        for candidate in self.list_reminders().await? {
            if !candidate.is_due(today) {
                continue;
            }
            let key = codec::reminder_key(&candidate.reminder_id);
            let _guard = self.locks.lock(&key).await;

            // Re-read under the lock; a concurrent cancel wins.
            let Some(mut reminder) = self.load(candidate.reminder_id).await? else {
                continue;
            };
            if !reminder.is_due(today) {
                continue;
            }
            reminder.status = ReminderStatus::Fired;
            self.store.set(&key, &codec::encode(&key, &reminder)?).await?;
            fired.push(reminder);
        }
        if !fired.is_empty() {
            info!("Fired {} due reminder(s)", fired.len());
        }
        Ok(fired)
    }

    async fn load(&self, id: ReminderId) -> Result<Option<Reminder>> {
        let key = codec::reminder_key(&id);
        let Some(raw) = self.store.get(&key).await? else {
            return Ok(None);
        };
        let reminder: Reminder = codec::decode(&key, &raw)?;
        if reminder.reminder_id != id {
            return Err(LedgerError::schema(
                &key,
                format!("record holds reminder {}", reminder.reminder_id),
            ));
        }
        Ok(Some(reminder))
    }

    async fn load_index(&self) -> Result<ReminderIndex> {
        match self.store.get(REMINDER_INDEX_KEY).await? {
            Some(raw) => codec::decode(REMINDER_INDEX_KEY, &raw),
            None => Ok(ReminderIndex::default()),
        }
    }

    async fn append_to_index(&self, id: ReminderId) -> Result<()> {
        let _guard = self.locks.lock(REMINDER_INDEX_KEY).await;
        let mut index = self.load_index().await?;
        index.reminder_ids.push(id);
        self.store
            .set(REMINDER_INDEX_KEY, &codec::encode(REMINDER_INDEX_KEY, &index)?)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use studymate_storage::{MemoryStore, StorageError};

    fn date(s: &str) -> Date {
        parse_date(s).unwrap()
    }

    fn registry() -> (ReminderRegistry, MemoryStore) {
        let store = MemoryStore::new();
        (ReminderRegistry::new(Arc::new(store.clone())), store)
    }

    /// Store that refuses writes to the reminder index.
    struct IndexWriteFails(MemoryStore);

    #[async_trait]
    impl KvStore for IndexWriteFails {
        async fn get(&self, key: &str) -> studymate_storage::Result<Option<String>> {
            self.0.get(key).await
        }
        async fn set(&self, key: &str, value: &str) -> studymate_storage::Result<()> {
            if key == REMINDER_INDEX_KEY {
                return Err(StorageError::Other("index volume full".to_string()));
            }
            self.0.set(key, value).await
        }
        async fn delete(&self, key: &str) -> studymate_storage::Result<()> {
            self.0.delete(key).await
        }
        async fn keys(&self, prefix: &str) -> studymate_storage::Result<Vec<String>> {
            self.0.keys(prefix).await
        }
    }

    /// Store whose reads always fail.
    struct Unreachable;

    #[async_trait]
    impl KvStore for Unreachable {
        async fn get(&self, _key: &str) -> studymate_storage::Result<Option<String>> {
            Err(StorageError::Other("connection refused".to_string()))
        }
        async fn set(&self, _key: &str, _value: &str) -> studymate_storage::Result<()> {
            Err(StorageError::Other("connection refused".to_string()))
        }
        async fn delete(&self, _key: &str) -> studymate_storage::Result<()> {
            Err(StorageError::Other("connection refused".to_string()))
        }
        async fn keys(&self, _prefix: &str) -> studymate_storage::Result<Vec<String>> {
            Err(StorageError::Other("connection refused".to_string()))
        }
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(date("2024-03-01"), Date::from_ymd_opt(2024, 3, 1).unwrap());
        assert!(matches!(parse_date("03/01/2024"), Err(LedgerError::Validation(_))));
        assert!(parse_date("2024-02-30").is_err());
    }

    #[tokio::test]
    async fn test_identical_reminders_get_distinct_ids() {
        let (registry, _) = registry();
        let a = registry.schedule_reminder("Review loops", date("2024-03-01")).await.unwrap();
        let b = registry.schedule_reminder("Review loops", date("2024-03-01")).await.unwrap();
        assert_ne!(a.reminder_id, b.reminder_id);

        let listed = registry.list_reminders().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].reminder_id, a.reminder_id);
        assert_eq!(listed[1].reminder_id, b.reminder_id);
    }

    #[tokio::test]
    async fn test_empty_message_rejected() {
        let (registry, store) = registry();
        let err = registry.schedule_reminder("", date("2024-03-01")).await.unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_list_skips_missing_records() {
        let (registry, store) = registry();
        let kept = registry.schedule_reminder("Keep", date("2024-03-01")).await.unwrap();
        let lost = registry.schedule_reminder("Lose", date("2024-03-02")).await.unwrap();
        store.delete(&codec::reminder_key(&lost.reminder_id)).await.unwrap();

        let listed = registry.list_reminders().await.unwrap();
        assert_eq!(listed, vec![kept]);
    }

    #[tokio::test]
    async fn test_list_on_empty_store() {
        let (registry, _) = registry();
        assert!(registry.list_reminders().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_index_append_keeps_unindexed_reminder() {
        let inner = MemoryStore::new();
        let registry = ReminderRegistry::new(Arc::new(IndexWriteFails(inner.clone())));

        let reminder = registry.schedule_reminder("Review loops", date("2024-03-01")).await.unwrap();

        assert!(registry.list_reminders().await.unwrap().is_empty());
        assert_eq!(registry.get_reminder(reminder.reminder_id).await.unwrap(), reminder);
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let registry = ReminderRegistry::new(Arc::new(Unreachable));
        let err = registry.schedule_reminder("Review", date("2024-03-01")).await.unwrap_err();
        assert!(matches!(err, LedgerError::Store(_)));
        assert!(matches!(registry.list_reminders().await, Err(LedgerError::Store(_))));
    }

    #[tokio::test]
    async fn test_cancel_transitions() {
        let (registry, _) = registry();
        let reminder = registry.schedule_reminder("Quiz day", date("2030-01-01")).await.unwrap();

        let cancelled = registry.cancel_reminder(reminder.reminder_id).await.unwrap();
        assert_eq!(cancelled.status, ReminderStatus::Cancelled);

        let again = registry.cancel_reminder(reminder.reminder_id).await.unwrap_err();
        assert!(matches!(again, LedgerError::Validation(_)));

        let missing = registry.cancel_reminder(ReminderId::new()).await.unwrap_err();
        assert!(missing.is_not_found());
    }

    #[tokio::test]
    async fn test_fire_due() {
        let (registry, _) = registry();
        let past = registry.schedule_reminder("Past", date("2024-03-01")).await.unwrap();
        let today = registry.schedule_reminder("Today", date("2024-03-05")).await.unwrap();
        let future = registry.schedule_reminder("Future", date("2024-03-06")).await.unwrap();
        let cancelled = registry.schedule_reminder("Cancelled", date("2024-03-01")).await.unwrap();
        registry.cancel_reminder(cancelled.reminder_id).await.unwrap();

        let fired = registry.fire_due(date("2024-03-05")).await.unwrap();
        let fired_ids: Vec<_> = fired.iter().map(|r| r.reminder_id).collect();
        assert_eq!(fired_ids, vec![past.reminder_id, today.reminder_id]);
        assert!(fired.iter().all(|r| r.status == ReminderStatus::Fired));

        let stored = registry.get_reminder(future.reminder_id).await.unwrap();
        assert_eq!(stored.status, ReminderStatus::Scheduled);

        // Nothing left to fire on a second pass.
        assert!(registry.fire_due(date("2024-03-05")).await.unwrap().is_empty());
    }
}
