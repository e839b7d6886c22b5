//! Progress ledger service.

use chrono::Utc;
use std::sync::Arc;
use studymate_core::{MilestoneStatus, ProgressReport, RoadmapProgress};
use studymate_storage::{KeyLocks, KvStore};
use tracing::{debug, info};

use crate::codec::{self, PROGRESS_PREFIX};
use crate::error::{require_non_empty, LedgerError, Result};

/// Largest drift tolerated between the stored and derived percentage.
const PERCENTAGE_TOLERANCE: f64 = 1e-9;

/// Per-roadmap milestone ledger over a key-value store.
///
/// Cloning is cheap; clones share the store and the write locks.
#[derive(Clone)]
pub struct ProgressLedger {
    store: Arc<dyn KvStore>,
    locks: Arc<KeyLocks>,
}

impl ProgressLedger {
    /// Create a ledger with its own lock table.
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self::with_locks(store, Arc::new(KeyLocks::new()))
    }

    /// Create a ledger sharing `locks` with other writers of the same store.
    pub fn with_locks(store: Arc<dyn KvStore>, locks: Arc<KeyLocks>) -> Self {
        Self { store, locks }
    }

    /// Record a milestone status given as its wire name
    /// (`completed`, `in_progress` or `not_started`).
    pub async fn record_milestone(
        &self,
        roadmap_id: &str,
        milestone_name: &str,
        status: &str,
    ) -> Result<RoadmapProgress> {
        let status: MilestoneStatus = status.parse()?;
        self.set_milestone_status(roadmap_id, milestone_name, status).await
    }

    /// Upsert a milestone and persist the recomputed ledger.
    ///
    /// The ledger is created on the first write for `roadmap_id`.
    pub async fn set_milestone_status(
        &self,
        roadmap_id: &str,
        milestone_name: &str,
        status: MilestoneStatus,
    ) -> Result<RoadmapProgress> {
        require_non_empty("roadmap_id", roadmap_id)?;
        require_non_empty("milestone_name", milestone_name)?;

        let key = codec::progress_key(roadmap_id);
        let _guard = self.locks.lock(&key).await;

        let now = Utc::now();
        let mut progress = match self.load(roadmap_id).await? {
            Some(progress) => progress,
            None => {
                info!("Starting progress ledger for roadmap {}", roadmap_id);
                RoadmapProgress::new(roadmap_id, now)
            }
        };

        progress.upsert_milestone(milestone_name, status, now);
        self.store.set(&key, &codec::encode(&key, &progress)?).await?;

        debug!(
            "Recorded {} = {} for {} ({:.1}%)",
            milestone_name, status, roadmap_id, progress.completion_percentage
        );
        Ok(progress)
    }

    /// Load a roadmap ledger, `None` if nothing was recorded yet.
    pub async fn load(&self, roadmap_id: &str) -> Result<Option<RoadmapProgress>> {
        let key = codec::progress_key(roadmap_id);
        let Some(raw) = self.store.get(&key).await? else {
            return Ok(None);
        };
        let progress: RoadmapProgress = codec::decode(&key, &raw)?;
        validate(&key, roadmap_id, progress).map(Some)
    }

    /// Load a roadmap ledger, failing with `NotFound` when absent.
    pub async fn get_progress(&self, roadmap_id: &str) -> Result<RoadmapProgress> {
        self.load(roadmap_id).await?.ok_or_else(|| {
            LedgerError::NotFound(format!("no progress data found for roadmap '{}'", roadmap_id))
        })
    }

    /// Bucketed report for a roadmap.
    pub async fn get_report(&self, roadmap_id: &str) -> Result<ProgressReport> {
        require_non_empty("roadmap_id", roadmap_id)?;
        let progress = self.get_progress(roadmap_id).await?;
        Ok(ProgressReport::from(&progress))
    }

    /// Ids of every roadmap with a ledger, sorted.
    pub async fn list_roadmaps(&self) -> Result<Vec<String>> {
        let keys = self.store.keys(PROGRESS_PREFIX).await?;
        Ok(keys
            .into_iter()
            .filter_map(|k| k.strip_prefix(PROGRESS_PREFIX).map(str::to_string))
            .collect())
    }
}

fn validate(key: &str, roadmap_id: &str, mut progress: RoadmapProgress) -> Result<RoadmapProgress> {
    if progress.roadmap_id != roadmap_id {
        return Err(LedgerError::schema(
            key,
            format!("record belongs to roadmap '{}'", progress.roadmap_id),
        ));
    }
    if let Some((entry, milestone)) = progress.milestones.iter().find(|(k, m)| **k != m.name) {
        return Err(LedgerError::schema(
            key,
            format!("milestone entry '{}' is named '{}'", entry, milestone.name),
        ));
    }

    let derived = progress.derived_percentage();
    if !progress.completion_percentage.is_finite()
        || (progress.completion_percentage - derived).abs() > PERCENTAGE_TOLERANCE
    {
        return Err(LedgerError::schema(
            key,
            format!(
                "completion_percentage {} does not match milestones ({})",
                progress.completion_percentage, derived
            ),
        ));
    }
    progress.completion_percentage = derived;
    Ok(progress)
}

#[cfg(test)]
mod tests {
    use super::*;
    use studymate_storage::MemoryStore;

    fn ledger() -> (ProgressLedger, MemoryStore) {
        let store = MemoryStore::new();
        (ProgressLedger::new(Arc::new(store.clone())), store)
    }

    #[tokio::test]
    async fn test_first_write_creates_ledger() {
        let (ledger, store) = ledger();
        let progress = ledger.record_milestone("py101", "intro", "completed").await.unwrap();

        assert_eq!(progress.roadmap_id, "py101");
        assert_eq!(progress.milestones.len(), 1);
        assert_eq!(progress.completion_percentage, 100.0);
        assert!(store.get("progress:py101").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_started_at_is_set_once() {
        let (ledger, _) = ledger();
        let first = ledger.record_milestone("py101", "intro", "in_progress").await.unwrap();
        let second = ledger.record_milestone("py101", "loops", "completed").await.unwrap();
        assert_eq!(first.started_at, second.started_at);
        assert!(second.milestones["loops"].updated_at >= first.milestones["intro"].updated_at);
    }

    #[tokio::test]
    async fn test_invalid_status_is_validation_error() {
        let (ledger, store) = ledger();
        let err = ledger.record_milestone("py101", "intro", "finished").await.unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_empty_ids_rejected() {
        let (ledger, _) = ledger();
        assert!(matches!(
            ledger.record_milestone("", "intro", "completed").await,
            Err(LedgerError::Validation(_))
        ));
        assert!(matches!(
            ledger.record_milestone("py101", " ", "completed").await,
            Err(LedgerError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_report_on_unknown_roadmap_is_not_found() {
        let (ledger, _) = ledger();
        let err = ledger.get_report("py101").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_report_buckets() {
        let (ledger, _) = ledger();
        ledger.record_milestone("py101", "intro", "completed").await.unwrap();
        ledger.record_milestone("py101", "loops", "in_progress").await.unwrap();

        let report = ledger.get_report("py101").await.unwrap();
        assert_eq!(report.total_milestones, 2);
        assert_eq!(report.completed, 1);
        assert_eq!(report.in_progress, 1);
        assert_eq!(report.not_started, 0);
        assert_eq!(report.completion_percentage, 50.0);
        assert_eq!(report.completed_milestones, vec!["intro".to_string()]);
        assert_eq!(report.current_milestones, vec!["loops".to_string()]);
        assert!(report.upcoming_milestones.is_empty());
    }

    #[tokio::test]
    async fn test_list_roadmaps() {
        let (ledger, store) = ledger();
        ledger.record_milestone("rust", "ownership", "not_started").await.unwrap();
        ledger.record_milestone("py101", "intro", "completed").await.unwrap();
        store.set("all_reminders", "{}").await.unwrap();

        assert_eq!(
            ledger.list_roadmaps().await.unwrap(),
            vec!["py101".to_string(), "rust".to_string()]
        );
    }

    #[tokio::test]
    async fn test_tampered_percentage_is_schema_error() {
        let (ledger, store) = ledger();
        ledger.record_milestone("py101", "intro", "in_progress").await.unwrap();

        let raw = store.get("progress:py101").await.unwrap().unwrap();
        let mut json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        json["completion_percentage"] = serde_json::json!(90.0);
        store.set("progress:py101", &json.to_string()).await.unwrap();

        let err = ledger.get_report("py101").await.unwrap_err();
        assert!(matches!(err, LedgerError::Schema { .. }));
    }

    #[tokio::test]
    async fn test_foreign_record_is_schema_error() {
        let (ledger, store) = ledger();
        ledger.record_milestone("rust", "ownership", "completed").await.unwrap();
        let raw = store.get("progress:rust").await.unwrap().unwrap();
        store.set("progress:py101", &raw).await.unwrap();

        let err = ledger.record_milestone("py101", "intro", "completed").await.unwrap_err();
        assert!(matches!(err, LedgerError::Schema { .. }));
    }
}
