// file: src/models/file_record.rs
// description: observed file model and the raw descriptor reported by listing adapters
// reference: internal data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fingerprint written for files whose content could not be read.
pub const ERROR_FINGERPRINT: &str = "ERROR";

/// Unvalidated file entry as returned by a listing adapter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawFileDescriptor {
    pub name: String,
    pub server_path: String,
    pub created_at: Option<String>,
    pub modified_at: Option<String>,
    pub length_bytes: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FileState {
    New,
    Modified,
    Valid,
    Error,
}

impl FileState {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileState::New => "NEW",
            FileState::Modified => "MODIFIED",
            FileState::Valid => "VALID",
            FileState::Error => "ERROR",
        }
    }
}

impl fmt::Display for FileState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileState {
    type Err = String;

    // Also accepts the labels found in inventories produced by earlier tooling.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_uppercase().as_str() {
            "NEW" | "NUEVO" => Ok(FileState::New),
            "MODIFIED" | "MODIFICADO" => Ok(FileState::Modified),
            "VALID" | "VÁLIDO" | "VALIDO" => Ok(FileState::Valid),
            "ERROR" | "ERROR EN LECTURA" => Ok(FileState::Error),
            other => Err(format!("unknown file state: {}", other)),
        }
    }
}

/// One observed file at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub file_type: String,
    pub link: String,
    pub created_at: Option<DateTime<Utc>>,
    pub modified_at: DateTime<Utc>,
    pub size_kb: f64,
    pub category: String,
    pub fingerprint: String,
    pub state: FileState,
}

impl FileRecord {
    pub fn has_readable_fingerprint(&self) -> bool {
        self.state != FileState::Error && self.fingerprint != ERROR_FINGERPRINT
    }
}

/// Kibibytes rounded to two decimals.
pub fn bytes_to_kb(bytes: u64) -> f64 {
    round2(bytes as f64 / 1024.0)
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_round_trips_through_labels() {
        assert_eq!("NEW".parse::<FileState>().unwrap(), FileState::New);
        assert_eq!("Válido".parse::<FileState>().unwrap(), FileState::Valid);
        assert_eq!("Modificado".parse::<FileState>().unwrap(), FileState::Modified);
        assert!("sideways".parse::<FileState>().is_err());
    }

    #[test]
    fn test_state_serializes_uppercase() {
        let json = serde_json::to_string(&FileState::Modified).unwrap();
        assert_eq!(json, "\"MODIFIED\"");
    }

    #[test]
    fn test_bytes_to_kb_rounds() {
        assert_eq!(bytes_to_kb(2048), 2.0);
        assert_eq!(bytes_to_kb(1000), 0.98);
        assert_eq!(bytes_to_kb(0), 0.0);
    }
}
