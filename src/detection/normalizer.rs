// file: src/detection/normalizer.rs
// description: boundary validation turning raw listing descriptors into candidate files
// reference: validate once at the adapter boundary

use crate::error::{MonitorError, Result};
use crate::models::file_record::bytes_to_kb;
use crate::models::{RawFileDescriptor, timestamp};
use crate::repository::FileClassifier;
use chrono::{DateTime, Utc};
use tracing::warn;

/// A validated file observation that has not been fingerprinted yet.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateFile {
    pub name: String,
    pub path: String,
    pub file_type: String,
    pub link: String,
    pub created_at: Option<DateTime<Utc>>,
    pub modified_at: DateTime<Utc>,
    pub size_kb: f64,
    pub category: String,
}

#[derive(Debug, Clone)]
pub struct FileNormalizer {
    link_base: String,
    classifier: FileClassifier,
}

impl FileNormalizer {
    pub fn new(link_base: impl Into<String>, classifier: FileClassifier) -> Self {
        Self {
            link_base: link_base.into(),
            classifier,
        }
    }

    pub fn normalize(&self, raw: &RawFileDescriptor) -> Result<CandidateFile> {
        let name = raw.name.trim();
        if name.is_empty() {
            return Err(MonitorError::per_file(
                raw.server_path.clone(),
                "descriptor has no file name",
            ));
        }

        let modified_raw = raw
            .modified_at
            .as_deref()
            .ok_or_else(|| MonitorError::per_file(name, "missing modification timestamp"))?;
        let modified_at = timestamp::parse(modified_raw).ok_or_else(|| {
            MonitorError::per_file(
                name,
                format!("unparseable modification timestamp {:?}", modified_raw),
            )
        })?;

        let created_at = match raw.created_at.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(value) if value.eq_ignore_ascii_case(timestamp::MISSING) => None,
            Some(value) => Some(timestamp::parse(value).ok_or_else(|| {
                MonitorError::per_file(name, format!("unparseable creation timestamp {:?}", value))
            })?),
        };

        let length = raw
            .length_bytes
            .ok_or_else(|| MonitorError::per_file(name, "missing size"))?;
        let length = u64::try_from(length)
            .map_err(|_| MonitorError::per_file(name, format!("negative size {}", length)))?;

        let path = if raw.server_path.trim().is_empty() {
            name.to_string()
        } else {
            raw.server_path.trim().to_string()
        };

        Ok(CandidateFile {
            name: name.to_string(),
            file_type: self.classifier.file_type(name),
            link: self.link_for(&path),
            category: self.classifier.extract_category(&path),
            path,
            created_at,
            modified_at,
            size_kb: bytes_to_kb(length),
        })
    }

    /// Normalizes a whole listing, logging and skipping descriptors that fail.
    pub fn normalize_all(&self, listing: &[RawFileDescriptor]) -> (Vec<CandidateFile>, usize) {
        let mut candidates = Vec::with_capacity(listing.len());
        let mut skipped = 0;

        for raw in listing {
            match self.normalize(raw) {
                Ok(candidate) => candidates.push(candidate),
                Err(e) => {
                    warn!("Skipping file: {}", e);
                    skipped += 1;
                }
            }
        }

        (candidates, skipped)
    }

    fn link_for(&self, path: &str) -> String {
        let escaped = path.replace(' ', "%20");
        if escaped.starts_with('/') {
            format!("{}{}", self.link_base, escaped)
        } else {
            format!("{}/{}", self.link_base, escaped)
        }
    }
}
