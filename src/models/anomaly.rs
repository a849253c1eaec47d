// file: src/models/anomaly.rs
// description: derived duplicate-name and duplicate-content report (never persisted)

use super::file_record::FileState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileVersion {
    pub name: String,
    #[serde(rename = "type")]
    pub file_type: String,
    pub path: String,
    pub link: String,
    pub modified_at: DateTime<Utc>,
    pub size_kb: f64,
    pub state: FileState,
    pub is_current_version: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateNameGroup {
    pub normalized_name: String,
    pub count: usize,
    /// Most recent first.
    pub versions: Vec<FileVersion>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdenticalFile {
    pub name: String,
    pub path: String,
    pub link: String,
    pub modified_at: DateTime<Utc>,
    pub size_kb: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateContentGroup {
    pub fingerprint: String,
    pub count: usize,
    pub files: Vec<IdenticalFile>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalySummary {
    pub total_files: usize,
    pub duplicate_name_groups: usize,
    pub duplicate_content_groups: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyReport {
    pub summary: AnomalySummary,
    pub duplicate_by_name: Vec<DuplicateNameGroup>,
    pub duplicate_by_fingerprint: Vec<DuplicateContentGroup>,
    pub total_files: usize,
}

impl AnomalyReport {
    pub fn new(
        duplicate_by_name: Vec<DuplicateNameGroup>,
        duplicate_by_fingerprint: Vec<DuplicateContentGroup>,
        total_files: usize,
    ) -> Self {
        Self {
            summary: AnomalySummary {
                total_files,
                duplicate_name_groups: duplicate_by_name.len(),
                duplicate_content_groups: duplicate_by_fingerprint.len(),
            },
            duplicate_by_name,
            duplicate_by_fingerprint,
            total_files,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.duplicate_by_name.is_empty() && self.duplicate_by_fingerprint.is_empty()
    }
}
