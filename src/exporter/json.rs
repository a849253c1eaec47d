// file: src/exporter/json.rs
// description: json export of inventory snapshots and anomaly reports

use crate::error::{MonitorError, Result};
use crate::models::{AnomalyReport, FileRecord};
use crate::store::atomic::write_atomic;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone)]
pub struct JsonExporter {
    output_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportManifest {
    pub exported_at: String,
    pub total_files: usize,
    pub duplicate_name_groups: usize,
    pub duplicate_content_groups: usize,
    pub files: Vec<String>,
}

impl JsonExporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    async fn write<T: Serialize + ?Sized>(
        &self,
        file_name: &str,
        value: &T,
        pretty: bool,
    ) -> Result<String> {
        let contents = if pretty {
            serde_json::to_vec_pretty(value)
        } else {
            serde_json::to_vec(value)
        }
        .map_err(|e| MonitorError::Serialization(format!("{}: {}", file_name, e)))?;

        write_atomic(&self.output_dir.join(file_name), &contents).await?;
        Ok(file_name.to_string())
    }

    /// Writes the inventory, its anomaly report and a manifest listing both.
    pub async fn export_all(
        &self,
        inventory: &[FileRecord],
        report: &AnomalyReport,
        pretty: bool,
    ) -> Result<ExportManifest> {
        info!("Starting JSON export to {:?}", self.output_dir);

        let files = vec![
            self.write("inventory.json", inventory, pretty).await?,
            self.write("anomalies.json", report, pretty).await?,
        ];

        let manifest = ExportManifest {
            exported_at: Utc::now().to_rfc3339(),
            total_files: inventory.len(),
            duplicate_name_groups: report.summary.duplicate_name_groups,
            duplicate_content_groups: report.summary.duplicate_content_groups,
            files,
        };
        self.write("manifest.json", &manifest, true).await?;

        info!(
            "Export complete: {} files, {} anomaly groups",
            manifest.total_files,
            manifest.duplicate_name_groups + manifest.duplicate_content_groups
        );
        Ok(manifest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FileState;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn record(name: &str) -> FileRecord {
        FileRecord {
            name: name.to_string(),
            path: format!("/Docs/{}", name),
            file_type: "PDF".to_string(),
            link: String::new(),
            created_at: None,
            modified_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            size_kb: 1.0,
            category: "general".to_string(),
            fingerprint: "f".to_string(),
            state: FileState::Valid,
        }
    }

    #[tokio::test]
    async fn test_export_all_writes_manifest() {
        let dir = tempdir().unwrap();
        let exporter = JsonExporter::new(dir.path().join("export"));
        let inventory = vec![record("a.pdf"), record("b.pdf")];
        let report = AnomalyReport::new(vec![], vec![], inventory.len());

        let manifest = exporter.export_all(&inventory, &report, false).await.unwrap();

        assert_eq!(manifest.total_files, 2);
        assert_eq!(manifest.files, vec!["inventory.json", "anomalies.json"]);

        let raw = std::fs::read_to_string(exporter.output_dir().join("manifest.json")).unwrap();
        let loaded: ExportManifest = serde_json::from_str(&raw).unwrap();
        assert_eq!(loaded.total_files, 2);

        let raw = std::fs::read_to_string(exporter.output_dir().join("inventory.json")).unwrap();
        let back: Vec<FileRecord> = serde_json::from_str(&raw).unwrap();
        assert_eq!(back, inventory);
    }
}
