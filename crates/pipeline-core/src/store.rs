use crate::catalog::catalog;
use crate::error::{PipelineError, Result};
use crate::opportunity::Opportunity;
use crate::{io, paths};
use crate::reconcile::{RecordSource, StageUpdater};
use crate::types::Taxonomy;
use fs2::FileExt;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

/// A stage write that reached the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageMove {
    pub record_id: String,
    pub taxonomy: Taxonomy,
    pub from: &'static str,
    pub to: &'static str,
}

impl StageMove {
    pub fn changed(&self) -> bool {
        self.from != self.to
    }
}

/// File-backed record set at `.pipeline/opportunities.yaml`.
///
/// Every call reads or writes the whole file. There is no cache, so two
/// processes sharing a root always see each other's writes. Mutations hold
/// an exclusive lock on `.pipeline/opportunities.lock` across their
/// read-modify-write, which serializes them across threads and processes.
#[derive(Debug, Clone)]
pub struct OpportunityStore {
    root: PathBuf,
}

impl OpportunityStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self) -> PathBuf {
        paths::store_path(&self.root)
    }

    /// Create an empty store. Returns false when one already exists.
    pub fn init(&self) -> Result<bool> {
        io::write_if_missing(&self.path(), b"[]\n")
    }

    pub fn load_all(&self) -> Result<Vec<Opportunity>> {
        // A blank file is a store with no records yet.
        let records: Option<Vec<Opportunity>> =
            io::read_yaml(&self.path())?.ok_or(PipelineError::NotInitialized)?;
        Ok(records.unwrap_or_default())
    }

    pub fn save_all(&self, records: &[Opportunity]) -> Result<()> {
        io::write_yaml(&self.path(), records)
    }

    pub fn find(&self, record_id: &str) -> Result<Opportunity> {
        self.load_all()?
            .into_iter()
            .find(|r| r.id == record_id)
            .ok_or_else(|| PipelineError::OpportunityNotFound(record_id.to_string()))
    }

    /// Insert a record, or replace the one with the same id.
    pub fn upsert(&self, record: Opportunity) -> Result<()> {
        let _lock = self.lock()?;
        let mut records = self.load_all()?;
        match records.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => *existing = record,
            None => records.push(record),
        }
        self.save_all(&records)
    }

    /// Move one record to `stage_id` in `taxonomy`.
    ///
    /// Stage ids outside the taxonomy's catalog are rejected before anything
    /// is read. A move to the stage the record already holds is not written.
    pub fn set_stage(&self, record_id: &str, taxonomy: Taxonomy, stage_id: &str) -> Result<StageMove> {
        let entry = catalog(taxonomy)
            .resolve(stage_id)
            .ok_or_else(|| PipelineError::InvalidStage {
                taxonomy: taxonomy.to_string(),
                stage: stage_id.to_string(),
            })?;

        let _lock = self.lock()?;
        let mut records = self.load_all()?;
        let record = records
            .iter_mut()
            .find(|r| r.id == record_id)
            .ok_or_else(|| PipelineError::OpportunityNotFound(record_id.to_string()))?;
        let from = record.set_stage(taxonomy, entry.id)?;
        let mv = StageMove {
            record_id: record_id.to_string(),
            taxonomy,
            from,
            to: entry.id,
        };

        if mv.changed() {
            self.save_all(&records)?;
            tracing::info!(
                record = record_id,
                taxonomy = %taxonomy,
                from,
                to = entry.id,
                "stage written"
            );
        }
        Ok(mv)
    }

    /// Block until this caller owns the store for writing. Released when the
    /// returned guard drops.
    fn lock(&self) -> Result<StoreLock> {
        if !self.path().exists() {
            return Err(PipelineError::NotInitialized);
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(paths::store_lock_path(&self.root))?;
        file.lock_exclusive()?;
        Ok(StoreLock(file))
    }
}

struct StoreLock(File);

impl Drop for StoreLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.0) {
            tracing::warn!("failed to release store lock: {e}");
        }
    }
}

impl RecordSource for OpportunityStore {
    fn fetch_records(&self) -> Result<Vec<Opportunity>> {
        self.load_all()
    }
}

impl StageUpdater for OpportunityStore {
    fn update_stage(&self, record_id: &str, taxonomy: Taxonomy, stage_id: &str) -> Result<()> {
        self.set_stage(record_id, taxonomy, stage_id).map(|_| ())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ForecastStage, PrimaryStage};
    use tempfile::TempDir;

    fn seeded() -> (TempDir, OpportunityStore) {
        let dir = TempDir::new().unwrap();
        let store = OpportunityStore::new(dir.path());
        assert!(store.init().unwrap());
        store.upsert(Opportunity::new("a1", "Navy IT")).unwrap();
        store.upsert(Opportunity::new("a2", "VA Claims")).unwrap();
        (dir, store)
    }

    #[test]
    fn missing_store_is_not_initialized() {
        let dir = TempDir::new().unwrap();
        let store = OpportunityStore::new(dir.path());
        assert!(matches!(store.load_all(), Err(PipelineError::NotInitialized)));
    }

    #[test]
    fn init_is_idempotent() {
        let (_dir, store) = seeded();
        assert!(!store.init().unwrap());
        assert_eq!(store.load_all().unwrap().len(), 2);
    }

    #[test]
    fn empty_file_loads_as_empty() {
        let dir = TempDir::new().unwrap();
        let store = OpportunityStore::new(dir.path());
        io::atomic_write(&store.path(), b"\n").unwrap();
        assert!(store.load_all().unwrap().is_empty());
    }

    #[test]
    fn set_stage_persists() {
        let (_dir, store) = seeded();
        let mv = store
            .set_stage("a1", Taxonomy::Primary, "opp qualified")
            .unwrap();
        assert_eq!(mv.from, "opp sourced");
        assert_eq!(mv.to, "opp qualified");
        assert_eq!(store.find("a1").unwrap().stage, PrimaryStage::Qualified);

        store
            .set_stage("a2", Taxonomy::Forecast, "High Priority")
            .unwrap();
        let a2 = store.find("a2").unwrap();
        assert_eq!(a2.forecast_stage, ForecastStage::HighPriority);
        assert_eq!(a2.stage, PrimaryStage::Sourced);
    }

    #[test]
    fn set_stage_rejects_foreign_stage() {
        let (_dir, store) = seeded();
        let err = store
            .set_stage("a1", Taxonomy::Forecast, "opp qualified")
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidStage { .. }));
        assert_eq!(store.find("a1").unwrap().forecast_stage, ForecastStage::Source);
    }

    #[test]
    fn set_stage_unknown_record() {
        let (_dir, store) = seeded();
        assert!(matches!(
            store.set_stage("zz", Taxonomy::Primary, "Win"),
            Err(PipelineError::OpportunityNotFound(_))
        ));
    }

    #[test]
    fn concurrent_moves_are_all_kept() {
        let dir = TempDir::new().unwrap();
        let store = OpportunityStore::new(dir.path());
        store.init().unwrap();
        let ids: Vec<String> = (0..16).map(|i| format!("r{i}")).collect();
        for id in &ids {
            store.upsert(Opportunity::new(id.as_str(), id.as_str())).unwrap();
        }

        std::thread::scope(|s| {
            for id in &ids {
                let store = OpportunityStore::new(dir.path());
                s.spawn(move || store.set_stage(id, Taxonomy::Primary, "Win").unwrap());
            }
        });

        let records = store.load_all().unwrap();
        assert_eq!(records.len(), 16);
        assert!(records.iter().all(|r| r.stage == PrimaryStage::Win));
    }

    #[test]
    fn mutations_need_an_initialized_store() {
        let dir = TempDir::new().unwrap();
        let store = OpportunityStore::new(dir.path());
        assert!(matches!(
            store.upsert(Opportunity::new("a1", "Navy IT")),
            Err(PipelineError::NotInitialized)
        ));
        assert!(!dir.path().join(".pipeline").exists());
    }

    #[test]
    fn same_stage_is_not_a_change() {
        let (_dir, store) = seeded();
        let mv = store.set_stage("a1", Taxonomy::Primary, "opp sourced").unwrap();
        assert!(!mv.changed());
    }
}
