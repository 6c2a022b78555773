//! Bounded generation history ledger

use tracing::{debug, info, warn};

use super::{FormInputs, GenerationRecord, GenerationStatus, HistoryError, Storage};

/// Storage key holding the serialized ledger
pub const HISTORY_KEY: &str = "recent_songs";

/// Maximum number of records retained
pub const HISTORY_LIMIT: usize = 10;

/// Field changes applied by [`HistoryStore::update_status`]
///
/// Optional fields are only written when present; omitted fields keep their
/// current value.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusUpdate {
    pub content_id: String,
    pub status: GenerationStatus,
    pub task_id: Option<String>,
    pub audio_url: Option<String>,
}

impl StatusUpdate {
    pub fn new(content_id: impl Into<String>, status: GenerationStatus) -> Self {
        Self {
            content_id: content_id.into(),
            status,
            task_id: None,
            audio_url: None,
        }
    }

    pub fn with_task_id(mut self, task_id: impl Into<String>) -> Self {
        self.task_id = Some(task_id.into());
        self
    }

    pub fn with_audio_url(mut self, audio_url: Option<String>) -> Self {
        self.audio_url = audio_url;
        self
    }
}

/// Most-recent-first list of generation records, persisted whole on every change
pub struct HistoryStore {
    storage: Box<dyn Storage>,
    records: Vec<GenerationRecord>,
    limit: usize,
}

impl HistoryStore {
    /// Load the ledger from storage
    ///
    /// A missing or unreadable ledger yields an empty history; this never fails.
    pub fn load(storage: Box<dyn Storage>) -> Self {
        let records = match storage.get(HISTORY_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<GenerationRecord>>(&raw) {
                Ok(records) => records,
                Err(e) => {
                    warn!(error = %e, "Discarding malformed history");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "Could not read history, starting empty");
                Vec::new()
            }
        };

        debug!(count = records.len(), "HistoryStore::load: loaded");
        Self {
            storage,
            records,
            limit: HISTORY_LIMIT,
        }
    }

    /// Insert at the head, replacing any record with the same content id,
    /// then drop everything past the retention limit
    pub fn append(&mut self, record: GenerationRecord) -> Result<(), HistoryError> {
        debug!(content_id = %record.content_id, "append: called");
        let mut next = Vec::with_capacity(self.limit);
        let content_id = record.content_id.clone();
        next.push(record);
        next.extend(self.records.iter().filter(|r| r.content_id != content_id).cloned());

        if next.len() > self.limit {
            let evicted = next.len() - self.limit;
            next.truncate(self.limit);
            debug!(evicted, "append: evicted oldest records");
        }

        self.commit(next)?;
        info!(%content_id, size = self.records.len(), "History record added");
        Ok(())
    }

    /// Apply a status change to the record with the matching content id
    ///
    /// Status is written unconditionally. Returns `false` without touching
    /// storage when no such record exists (it may have been evicted).
    pub fn update_status(&mut self, update: StatusUpdate) -> Result<bool, HistoryError> {
        debug!(content_id = %update.content_id, status = %update.status, "update_status: called");
        let Some(index) = self.records.iter().position(|r| r.content_id == update.content_id) else {
            debug!(content_id = %update.content_id, "update_status: unknown content id, ignoring");
            return Ok(false);
        };

        let mut next = self.records.clone();
        let record = &mut next[index];
        record.status = update.status;
        if let Some(task_id) = update.task_id {
            record.task_id = Some(task_id);
        }
        if let Some(audio_url) = update.audio_url {
            record.audio_url = Some(audio_url);
        }

        self.commit(next)?;
        info!(content_id = %update.content_id, status = %update.status, "History record updated");
        Ok(true)
    }

    /// Inputs of the record at `index`, for refilling the request form
    pub fn reapply_to_form(&self, index: usize) -> Option<FormInputs> {
        self.records.get(index).map(GenerationRecord::inputs)
    }

    pub fn records(&self) -> &[GenerationRecord] {
        &self.records
    }

    pub fn get(&self, content_id: &str) -> Option<&GenerationRecord> {
        self.records.iter().find(|r| r.content_id == content_id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Persist first so memory never runs ahead of storage
    fn commit(&mut self, next: Vec<GenerationRecord>) -> Result<(), HistoryError> {
        let raw = serde_json::to_string(&next)?;
        self.storage.set(HISTORY_KEY, &raw)?;
        self.records = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::{FileStorage, MemoryStorage};
    use tempfile::TempDir;

    fn record(content_id: &str) -> GenerationRecord {
        let inputs = FormInputs::new(format!("prompt {}", content_id), "jazz", "calm");
        GenerationRecord::new(content_id, &inputs, "some lyrics")
    }

    fn ids(store: &HistoryStore) -> Vec<String> {
        store.records().iter().map(|r| r.content_id.clone()).collect()
    }

    #[test]
    fn test_append_inserts_at_head() {
        let mut store = HistoryStore::load(Box::new(MemoryStorage::new()));
        store.append(record("c1")).unwrap();
        store.append(record("c2")).unwrap();
        store.append(record("c3")).unwrap();

        assert_eq!(ids(&store), vec!["c3", "c2", "c1"]);
    }

    #[test]
    fn test_eleventh_record_evicts_oldest() {
        let mut store = HistoryStore::load(Box::new(MemoryStorage::new()));
        for i in 0..HISTORY_LIMIT {
            store.append(record(&format!("c{}", i))).unwrap();
        }
        assert_eq!(store.len(), HISTORY_LIMIT);

        store.append(record("newest")).unwrap();

        assert_eq!(store.len(), HISTORY_LIMIT);
        assert_eq!(store.records()[0].content_id, "newest");
        assert!(store.get("c0").is_none(), "oldest record should be evicted");
        assert!(store.get("c1").is_some());
    }

    #[test]
    fn test_append_existing_content_id_replaces_and_moves_to_head() {
        let mut store = HistoryStore::load(Box::new(MemoryStorage::new()));
        store.append(record("c1")).unwrap();
        store.append(record("c2")).unwrap();
        store.append(record("c1")).unwrap();

        assert_eq!(ids(&store), vec!["c1", "c2"]);
    }

    #[test]
    fn test_update_status_unknown_id_is_noop() {
        let storage = MemoryStorage::new();
        let mut store = HistoryStore::load(Box::new(storage.clone()));
        store.append(record("c1")).unwrap();
        let before = store.records().to_vec();
        let persisted_before = storage.get(HISTORY_KEY).unwrap();

        let updated = store
            .update_status(StatusUpdate::new("ghost", GenerationStatus::Completed))
            .unwrap();

        assert!(!updated);
        assert_eq!(store.records(), before.as_slice());
        assert_eq!(storage.get(HISTORY_KEY).unwrap(), persisted_before);
    }

    #[test]
    fn test_update_status_leaves_omitted_fields() {
        let mut store = HistoryStore::load(Box::new(MemoryStorage::new()));
        store.append(record("c1")).unwrap();

        store
            .update_status(StatusUpdate::new("c1", GenerationStatus::Generating).with_task_id("t1"))
            .unwrap();
        store
            .update_status(StatusUpdate::new("c1", GenerationStatus::Completed).with_audio_url(Some("u1".to_string())))
            .unwrap();

        let rec = store.get("c1").unwrap();
        assert_eq!(rec.status, GenerationStatus::Completed);
        assert_eq!(rec.task_id.as_deref(), Some("t1"));
        assert_eq!(rec.audio_url.as_deref(), Some("u1"));
    }

    #[test]
    fn test_ledger_survives_reload() {
        let temp = TempDir::new().unwrap();
        {
            let mut store = HistoryStore::load(Box::new(FileStorage::open(temp.path()).unwrap()));
            store.append(record("c1")).unwrap();
            store.append(record("c2")).unwrap();
            store.append(record("c3")).unwrap();
        }

        let reloaded = HistoryStore::load(Box::new(FileStorage::open(temp.path()).unwrap()));
        assert_eq!(ids(&reloaded), vec!["c3", "c2", "c1"]);
        assert_eq!(reloaded.records()[0].prompt, "prompt c3");
    }

    #[test]
    fn test_malformed_history_loads_empty() {
        let storage = MemoryStorage::new();
        storage.set(HISTORY_KEY, "{not json").unwrap();

        let store = HistoryStore::load(Box::new(storage));
        assert!(store.is_empty());
    }

    #[test]
    fn test_reapply_to_form() {
        let mut store = HistoryStore::load(Box::new(MemoryStorage::new()));
        store.append(record("c1")).unwrap();
        store.append(record("c2")).unwrap();

        let inputs = store.reapply_to_form(1).unwrap();
        assert_eq!(inputs, FormInputs::new("prompt c1", "jazz", "calm"));
        assert_eq!(store.reapply_to_form(2), None);
    }
}
