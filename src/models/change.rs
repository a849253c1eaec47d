// file: src/models/change.rs
// description: detected file transitions and their change-log envelope

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    New,
    Modified,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub kind: ChangeKind,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_modified_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_modified_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_fingerprint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_fingerprint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl ChangeRecord {
    pub fn new_file(name: String, created_at: Option<DateTime<Utc>>) -> Self {
        Self {
            kind: ChangeKind::New,
            name,
            previous_modified_at: None,
            new_modified_at: None,
            previous_fingerprint: None,
            new_fingerprint: None,
            created_at,
        }
    }

    pub fn modified(
        name: String,
        previous_modified_at: DateTime<Utc>,
        new_modified_at: DateTime<Utc>,
        previous_fingerprint: String,
        new_fingerprint: String,
    ) -> Self {
        Self {
            kind: ChangeKind::Modified,
            name,
            previous_modified_at: Some(previous_modified_at),
            new_modified_at: Some(new_modified_at),
            previous_fingerprint: Some(previous_fingerprint),
            new_fingerprint: Some(new_fingerprint),
            created_at: None,
        }
    }
}

/// A change as stored in the append-only change log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeLogEntry {
    pub cycle_id: String,
    pub recorded_at: DateTime<Utc>,
    #[serde(flatten)]
    pub change: ChangeRecord,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_new_change_omits_modification_fields() {
        let created = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let change = ChangeRecord::new_file("Plan.docx".to_string(), Some(created));
        let json = serde_json::to_value(&change).unwrap();

        assert_eq!(json["kind"], "NEW");
        assert_eq!(json["created_at"], "2024-01-02T03:04:05Z");
        assert!(json.get("previous_fingerprint").is_none());
        assert!(json.get("new_modified_at").is_none());
    }

    #[test]
    fn test_log_entry_flattens_change() {
        let entry = ChangeLogEntry {
            cycle_id: "c1".to_string(),
            recorded_at: Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
            change: ChangeRecord::new_file("a.pdf".to_string(), None),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["name"], "a.pdf");

        let back: ChangeLogEntry = serde_json::from_value(json).unwrap();
        assert_eq!(back, entry);
    }
}
