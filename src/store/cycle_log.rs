// file: src/store/cycle_log.rs
// description: bounded log of completed reconciliation cycles

use super::atomic::{read_json_or_default, write_json_atomic};
use crate::error::Result;
use crate::models::ChangeRecord;
use crate::pipeline::CycleStats;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

const COLLABORATOR: &str = "cycle log";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleRecord {
    pub cycle_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub total_files: usize,
    pub stats: CycleStats,
    pub changes: Vec<ChangeRecord>,
    pub inventory_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleLogStats {
    pub total_records: usize,
    pub total_changes: usize,
    pub last_update: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct CycleLogStore {
    storage_path: PathBuf,
    max_records: usize,
}

impl CycleLogStore {
    pub fn new(storage_path: impl Into<PathBuf>, max_records: usize) -> Self {
        Self {
            storage_path: storage_path.into(),
            max_records: max_records.max(1),
        }
    }

    pub fn path(&self) -> &Path {
        &self.storage_path
    }

    pub async fn load(&self) -> Result<Vec<CycleRecord>> {
        read_json_or_default(&self.storage_path, COLLABORATOR).await
    }

    /// Appends `record` and drops the oldest records beyond the retention limit.
    pub async fn append(&self, record: CycleRecord) -> Result<()> {
        let mut records = self.load().await?;
        records.push(record);

        if records.len() > self.max_records {
            let excess = records.len() - self.max_records;
            records.drain(..excess);
            debug!("Trimmed {} old cycle records", excess);
        }

        write_json_atomic(&self.storage_path, &records).await
    }

    pub fn stats(records: &[CycleRecord]) -> CycleLogStats {
        CycleLogStats {
            total_records: records.len(),
            total_changes: records.iter().map(|r| r.changes.len()).sum(),
            last_update: records.iter().map(|r| r.finished_at).max(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn record(id: &str, minute: u32, changes: usize) -> CycleRecord {
        let started = Utc.with_ymd_and_hms(2024, 5, 1, 10, minute, 0).unwrap();
        CycleRecord {
            cycle_id: id.to_string(),
            started_at: started,
            finished_at: started + Duration::seconds(5),
            total_files: 3,
            stats: CycleStats::new(),
            changes: (0..changes)
                .map(|i| ChangeRecord::new_file(format!("f{}.pdf", i), None))
                .collect(),
            inventory_path: "output/inventory.csv".to_string(),
            object_key: None,
        }
    }

    #[tokio::test]
    async fn test_append_trims_to_retention() {
        let dir = tempdir().unwrap();
        let store = CycleLogStore::new(dir.path().join("cycles.json"), 2);

        store.append(record("c1", 1, 1)).await.unwrap();
        store.append(record("c2", 2, 0)).await.unwrap();
        store.append(record("c3", 3, 2)).await.unwrap();

        let records = store.load().await.unwrap();
        let ids: Vec<_> = records.iter().map(|r| r.cycle_id.as_str()).collect();
        assert_eq!(ids, vec!["c2", "c3"]);
    }

    #[test]
    fn test_stats_summarize_records() {
        let records = vec![record("c1", 1, 3), record("c2", 7, 1)];

        let stats = CycleLogStore::stats(&records);

        assert_eq!(stats.total_records, 2);
        assert_eq!(stats.total_changes, 4);
        assert_eq!(stats.last_update, Some(records[1].finished_at));
    }

    #[test]
    fn test_stats_of_empty_log() {
        let stats = CycleLogStore::stats(&[]);
        assert_eq!(stats.total_records, 0);
        assert_eq!(stats.last_update, None);
    }
}
