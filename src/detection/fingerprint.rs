// file: src/detection/fingerprint.rs
// description: deterministic sha-256 fingerprints over file metadata or file bytes
// reference: https://docs.rs/sha2

use super::normalizer::CandidateFile;
use crate::config::FingerprintMode;
use crate::models::{ERROR_FINGERPRINT, timestamp};
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

const FIELD_DELIMITER: char = '|';

/// Lower-case hex SHA-256 of `material`.
pub fn digest(material: impl AsRef<[u8]>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(material.as_ref());
    format!("{:x}", hasher.finalize())
}

pub fn metadata_material(name: &str, modified_at: &DateTime<Utc>, size_kb: f64) -> String {
    format!(
        "{}{}{}{}{:.2}",
        name,
        FIELD_DELIMITER,
        timestamp::canonical(modified_at),
        FIELD_DELIMITER,
        size_kb
    )
}

pub fn metadata_fingerprint(candidate: &CandidateFile) -> String {
    digest(metadata_material(
        &candidate.name,
        &candidate.modified_at,
        candidate.size_kb,
    ))
}

pub fn content_fingerprint(bytes: &[u8]) -> String {
    digest(bytes)
}

/// Result of fingerprinting one candidate.
#[derive(Debug, Clone, PartialEq)]
pub enum FingerprintOutcome {
    Digest(String),
    Failed(String),
}

impl FingerprintOutcome {
    pub fn from_content(bytes: &[u8]) -> Self {
        Self::Digest(content_fingerprint(bytes))
    }

    /// The digest, or the `ERROR` sentinel when fingerprinting failed.
    pub fn value(&self) -> &str {
        match self {
            Self::Digest(value) => value,
            Self::Failed(_) => ERROR_FINGERPRINT,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// A normalized candidate paired with its fingerprint.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservedFile {
    pub candidate: CandidateFile,
    pub fingerprint: FingerprintOutcome,
}

impl ObservedFile {
    pub fn new(candidate: CandidateFile, fingerprint: FingerprintOutcome) -> Self {
        Self {
            candidate,
            fingerprint,
        }
    }

    pub fn with_metadata_fingerprint(candidate: CandidateFile) -> Self {
        let fingerprint = FingerprintOutcome::Digest(metadata_fingerprint(&candidate));
        Self::new(candidate, fingerprint)
    }
}

/// Whether the cycle has to download bytes for `mode`.
pub fn requires_content(mode: FingerprintMode) -> bool {
    mode == FingerprintMode::Content
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn candidate(name: &str, size_kb: f64) -> CandidateFile {
        CandidateFile {
            name: name.to_string(),
            path: format!("/docs/{}", name),
            file_type: "PDF".to_string(),
            link: format!("https://example.com/docs/{}", name),
            created_at: None,
            modified_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            size_kb,
            category: "general".to_string(),
        }
    }

    #[test]
    fn test_digest_is_stable_sha256() {
        assert_eq!(
            digest("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(digest(b"same bytes"), digest(b"same bytes"));
    }

    #[test]
    fn test_metadata_material_layout() {
        let modified = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        assert_eq!(
            metadata_material("a.pdf", &modified, 1.5),
            "a.pdf|2024-05-01T12:00:00Z|1.50"
        );
    }

    #[test]
    fn test_metadata_fingerprint_changes_with_each_field() {
        let base = candidate("a.pdf", 10.0);
        let reference = metadata_fingerprint(&base);
        assert_eq!(reference, metadata_fingerprint(&base.clone()));

        let mut renamed = base.clone();
        renamed.name = "b.pdf".to_string();
        assert_ne!(reference, metadata_fingerprint(&renamed));

        let mut touched = base.clone();
        touched.modified_at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 1).unwrap();
        assert_ne!(reference, metadata_fingerprint(&touched));

        let mut resized = base.clone();
        resized.size_kb = 10.01;
        assert_ne!(reference, metadata_fingerprint(&resized));

        // link and category are not fingerprint material
        let mut moved = base;
        moved.link = "https://elsewhere".to_string();
        assert_eq!(reference, metadata_fingerprint(&moved));
    }

    #[test]
    fn test_failed_outcome_uses_sentinel() {
        let outcome = FingerprintOutcome::Failed("timeout".to_string());
        assert_eq!(outcome.value(), ERROR_FINGERPRINT);
        assert!(outcome.is_failed());
    }
}
