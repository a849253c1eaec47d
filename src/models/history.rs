// file: src/models/history.rs
// description: persisted per-file history entry keyed by file name

use super::file_record::{FileRecord, FileState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Snapshot of the last committed cycle, keyed by file name.
pub type History = BTreeMap<String, HistoryEntry>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub modified_at: DateTime<Utc>,
    pub size_kb: f64,
    pub fingerprint: String,
    pub state: FileState,
}

impl From<&FileRecord> for HistoryEntry {
    fn from(record: &FileRecord) -> Self {
        Self {
            modified_at: record.modified_at,
            size_kb: record.size_kb,
            fingerprint: record.fingerprint.clone(),
            state: record.state,
        }
    }
}
