// file: src/api/report.rs
// description: read-side views built from the latest inventory and history snapshots

use crate::detection::AnomalyDetector;
use crate::exporter::InventoryRow;
use crate::models::{
    AnomalyReport, DuplicateNameGroup, ERROR_FINGERPRINT, FileRecord, FileState, History,
    file_record::round2, timestamp,
};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

const RECENT_PER_TYPE: usize = 5;

/// Rebuilds file records from inventory rows, taking fingerprints from `history`.
/// Rows without a usable modification timestamp are dropped.
pub fn records_from_rows(rows: &[InventoryRow], history: &History) -> Vec<FileRecord> {
    rows.iter()
        .filter_map(|row| {
            let Some(modified_at) = row.modified_at() else {
                debug!("Ignoring inventory row {} without modification time", row.name);
                return None;
            };

            let fingerprint = history
                .get(&row.name)
                .map(|entry| entry.fingerprint.clone())
                .unwrap_or_else(|| ERROR_FINGERPRINT.to_string());

            Some(FileRecord {
                name: row.name.clone(),
                path: row.path.clone(),
                file_type: row.file_type.clone(),
                link: row.url.clone(),
                created_at: row.created_at(),
                modified_at,
                size_kb: row.size_kb,
                category: row.category.clone(),
                fingerprint,
                state: row.state().unwrap_or(FileState::Valid),
            })
        })
        .collect()
}

pub fn anomaly_report(
    rows: &[InventoryRow],
    history: &History,
    detector: &AnomalyDetector,
) -> AnomalyReport {
    detector.detect(&records_from_rows(rows, history))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportFile {
    pub name: String,
    #[serde(rename = "type")]
    pub file_type: String,
    pub url: String,
    pub modified_at: String,
    pub size_kb: f64,
    pub category: String,
    pub state: FileState,
}

impl From<&FileRecord> for ReportFile {
    fn from(record: &FileRecord) -> Self {
        Self {
            name: record.name.clone(),
            file_type: record.file_type.clone(),
            url: record.link.clone(),
            modified_at: timestamp::format_table(&record.modified_at),
            size_kb: round2(record.size_kb),
            category: record.category.clone(),
            state: record.state,
        }
    }
}

/// Files modified within each window, measured back from the latest modification.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PeriodBreakdown {
    pub last_hour: Vec<ReportFile>,
    pub last_24h: Vec<ReportFile>,
    pub last_week: Vec<ReportFile>,
    pub last_month: Vec<ReportFile>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeBreakdown {
    #[serde(rename = "type")]
    pub file_type: String,
    pub count: usize,
    pub total_size_kb: f64,
    pub last_modified: String,
    pub recent_files: Vec<ReportFile>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateBreakdown {
    pub total: usize,
    pub groups: Vec<DuplicateNameGroup>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeSummary {
    pub last_update: Option<String>,
    pub files_last_hour: usize,
    pub files_last_24h: usize,
    pub files_last_week: usize,
    pub total_files: usize,
    pub total_duplicates: usize,
    pub total_size_kb: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeReport {
    pub summary: ChangeSummary,
    pub recent_changes: PeriodBreakdown,
    pub duplicates: DuplicateBreakdown,
    pub file_types: Vec<TypeBreakdown>,
}

fn modified_since(records: &[FileRecord], since: DateTime<Utc>) -> Vec<ReportFile> {
    records
        .iter()
        .filter(|r| r.modified_at > since)
        .map(ReportFile::from)
        .collect()
}

fn type_breakdown(records: &[FileRecord]) -> Vec<TypeBreakdown> {
    let mut order: Vec<&str> = Vec::new();
    let mut by_type: HashMap<&str, Vec<&FileRecord>> = HashMap::new();
    for record in records {
        let members = by_type.entry(record.file_type.as_str()).or_default();
        if members.is_empty() {
            order.push(record.file_type.as_str());
        }
        members.push(record);
    }

    // records arrive newest first, so the first member is the latest
    let mut breakdown: Vec<(DateTime<Utc>, TypeBreakdown)> = order
        .into_iter()
        .filter_map(|file_type| {
            let members = by_type.remove(file_type)?;
            let latest = members.first()?.modified_at;
            Some((
                latest,
                TypeBreakdown {
                    file_type: file_type.to_string(),
                    count: members.len(),
                    total_size_kb: round2(members.iter().map(|r| r.size_kb).sum()),
                    last_modified: timestamp::format_table(&latest),
                    recent_files: members
                        .iter()
                        .take(RECENT_PER_TYPE)
                        .map(|r| ReportFile::from(*r))
                        .collect(),
                },
            ))
        })
        .collect();

    breakdown.sort_by(|a, b| b.0.cmp(&a.0));
    breakdown.into_iter().map(|(_, t)| t).collect()
}

/// Period, duplicate and per-type breakdown of an inventory.
pub fn change_report(
    rows: &[InventoryRow],
    history: &History,
    detector: &AnomalyDetector,
) -> ChangeReport {
    let mut records = records_from_rows(rows, history);
    records.sort_by(|a, b| b.modified_at.cmp(&a.modified_at));

    let latest = records.first().map(|r| r.modified_at);
    let recent_changes = match latest {
        Some(latest) => PeriodBreakdown {
            last_hour: modified_since(&records, latest - Duration::hours(1)),
            last_24h: modified_since(&records, latest - Duration::days(1)),
            last_week: modified_since(&records, latest - Duration::days(7)),
            last_month: modified_since(&records, latest - Duration::days(30)),
        },
        None => PeriodBreakdown::default(),
    };

    let groups = detector.detect(&records).duplicate_by_name;
    let file_types = type_breakdown(&records);

    ChangeReport {
        summary: ChangeSummary {
            last_update: latest.as_ref().map(timestamp::format_table),
            files_last_hour: recent_changes.last_hour.len(),
            files_last_24h: recent_changes.last_24h.len(),
            files_last_week: recent_changes.last_week.len(),
            total_files: records.len(),
            total_duplicates: groups.len(),
            total_size_kb: round2(records.iter().map(|r| r.size_kb).sum()),
        },
        recent_changes,
        duplicates: DuplicateBreakdown {
            total: groups.len(),
            groups,
        },
        file_types,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnomalyConfig;
    use crate::models::HistoryEntry;
    use pretty_assertions::assert_eq;

    fn row(name: &str, file_type: &str, modified: &str, size_kb: f64) -> InventoryRow {
        InventoryRow {
            name: name.to_string(),
            path: format!("/Docs/{}", name),
            url: format!("https://contoso.sharepoint.com/Docs/{}", name),
            file_type: file_type.to_string(),
            created_at: "N/A".to_string(),
            modified_at: modified.to_string(),
            size_kb,
            category: "general".to_string(),
            state: "VALID".to_string(),
        }
    }

    fn detector() -> AnomalyDetector {
        AnomalyDetector::from_config(&AnomalyConfig::default()).unwrap()
    }

    fn inventory() -> Vec<InventoryRow> {
        vec![
            row("Report.pdf", "PDF", "2024-05-10 12:00:00", 10.0),
            row("Report (1).pdf", "PDF", "2024-05-10 11:30:00", 11.0),
            row("Budget.xlsx", "XLSX", "2024-05-09 18:00:00", 5.5),
            row("Old.docx", "DOCX", "2024-05-01 09:00:00", 1.25),
            row("Ancient.docx", "DOCX", "2024-01-01 09:00:00", 2.0),
            row("broken.pdf", "PDF", "N/A", 3.0),
        ]
    }

    #[test]
    fn test_period_windows_are_relative_to_latest() {
        let report = change_report(&inventory(), &History::new(), &detector());

        assert_eq!(report.summary.last_update.as_deref(), Some("2024-05-10 12:00:00"));
        assert_eq!(report.summary.total_files, 5);
        let names = |files: &[ReportFile]| files.iter().map(|f| f.name.clone()).collect::<Vec<_>>();
        assert_eq!(
            names(&report.recent_changes.last_hour),
            vec!["Report.pdf", "Report (1).pdf"]
        );
        assert_eq!(
            names(&report.recent_changes.last_24h),
            vec!["Report.pdf", "Report (1).pdf", "Budget.xlsx"]
        );
        assert_eq!(report.recent_changes.last_week.len(), 3);
        assert_eq!(report.recent_changes.last_month.len(), 4);
        assert_eq!(report.summary.files_last_hour, 2);
        assert_eq!(report.summary.total_size_kb, 29.75);
    }

    #[test]
    fn test_duplicates_and_type_breakdown() {
        let report = change_report(&inventory(), &History::new(), &detector());

        assert_eq!(report.duplicates.total, 1);
        assert_eq!(report.duplicates.groups[0].normalized_name, "Report.pdf");
        assert_eq!(report.duplicates.groups[0].versions[0].name, "Report.pdf");

        let types: Vec<_> = report.file_types.iter().map(|t| t.file_type.as_str()).collect();
        assert_eq!(types, vec!["PDF", "XLSX", "DOCX"]);
        let docx = &report.file_types[2];
        assert_eq!(docx.count, 2);
        assert_eq!(docx.total_size_kb, 3.25);
        assert_eq!(docx.last_modified, "2024-05-01 09:00:00");
        assert_eq!(docx.recent_files[0].name, "Old.docx");
    }

    #[test]
    fn test_empty_inventory_report() {
        let report = change_report(&[], &History::new(), &detector());
        assert_eq!(report.summary.last_update, None);
        assert_eq!(report.summary.total_files, 0);
        assert!(report.file_types.is_empty());
    }

    #[test]
    fn test_anomaly_report_joins_history_fingerprints() {
        let rows = vec![
            row("Plan.docx", "DOCX", "2024-05-01 09:00:00", 1.0),
            row("Plan copy.docx", "DOCX", "2024-05-02 09:00:00", 1.0),
            row("Unknown.docx", "DOCX", "2024-05-02 09:00:00", 1.0),
        ];
        let mut history = History::new();
        for name in ["Plan.docx", "Plan copy.docx"] {
            history.insert(
                name.to_string(),
                HistoryEntry {
                    modified_at: Utc::now(),
                    size_kb: 1.0,
                    fingerprint: "same".to_string(),
                    state: FileState::Valid,
                },
            );
        }

        let report = anomaly_report(&rows, &history, &detector());

        assert_eq!(report.total_files, 3);
        assert_eq!(report.duplicate_by_fingerprint.len(), 1);
        assert_eq!(report.duplicate_by_fingerprint[0].count, 2);
    }
}
