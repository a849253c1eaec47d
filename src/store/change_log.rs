// file: src/store/change_log.rs
// description: append-only feed of detected changes across cycles

use super::atomic::{read_json_or_default, write_json_atomic};
use crate::error::Result;
use crate::models::{ChangeLogEntry, ChangeRecord};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tracing::debug;

const COLLABORATOR: &str = "change log";

#[derive(Debug, Clone)]
pub struct ChangeLogStore {
    storage_path: PathBuf,
}

impl ChangeLogStore {
    pub fn new(storage_path: impl Into<PathBuf>) -> Self {
        Self {
            storage_path: storage_path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.storage_path
    }

    pub async fn load(&self) -> Result<Vec<ChangeLogEntry>> {
        read_json_or_default(&self.storage_path, COLLABORATOR).await
    }

    /// Appends one cycle's changes. A cycle without changes leaves the file untouched.
    pub async fn append(
        &self,
        cycle_id: &str,
        recorded_at: DateTime<Utc>,
        changes: &[ChangeRecord],
    ) -> Result<usize> {
        if changes.is_empty() {
            return Ok(0);
        }

        let mut entries = self.load().await?;
        entries.extend(changes.iter().cloned().map(|change| ChangeLogEntry {
            cycle_id: cycle_id.to_string(),
            recorded_at,
            change,
        }));

        write_json_atomic(&self.storage_path, &entries).await?;
        debug!(
            "Appended {} changes to {:?} ({} total)",
            changes.len(),
            self.storage_path,
            entries.len()
        );
        Ok(changes.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChangeKind;
    use chrono::TimeZone;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_append_accumulates_across_cycles() {
        let dir = tempdir().unwrap();
        let store = ChangeLogStore::new(dir.path().join("novedades.json"));
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();

        store
            .append("c1", at, &[ChangeRecord::new_file("a.pdf".to_string(), None)])
            .await
            .unwrap();
        store
            .append(
                "c2",
                at,
                &[ChangeRecord::modified(
                    "a.pdf".to_string(),
                    at,
                    at,
                    "old".to_string(),
                    "new".to_string(),
                )],
            )
            .await
            .unwrap();

        let entries = store.load().await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].cycle_id, "c1");
        assert_eq!(entries[1].change.kind, ChangeKind::Modified);
    }

    #[tokio::test]
    async fn test_empty_append_does_not_create_file() {
        let dir = tempdir().unwrap();
        let store = ChangeLogStore::new(dir.path().join("novedades.json"));

        let written = store.append("c1", Utc::now(), &[]).await.unwrap();

        assert_eq!(written, 0);
        assert!(!store.path().exists());
    }
}
