// file: src/detection/reconciler.rs
// description: classifies observed files against the previous history snapshot
// reference: fold over the listing producing inventory, change feed and next history

use super::fingerprint::{FingerprintOutcome, ObservedFile};
use super::normalizer::FileNormalizer;
use crate::models::{ChangeRecord, FileRecord, FileState, History, HistoryEntry, RawFileDescriptor};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Output of one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconciliation {
    /// In listing order.
    pub inventory: Vec<FileRecord>,
    pub changes: Vec<ChangeRecord>,
    /// Full replacement for the stored history.
    pub new_history: History,
    /// Descriptors dropped during normalization.
    pub skipped: usize,
}

impl Reconciliation {
    pub fn count(&self, state: FileState) -> usize {
        self.inventory.iter().filter(|r| r.state == state).count()
    }
}

pub struct Reconciler {
    normalizer: FileNormalizer,
}

impl Reconciler {
    pub fn new(normalizer: FileNormalizer) -> Self {
        Self { normalizer }
    }

    pub fn normalizer(&self) -> &FileNormalizer {
        &self.normalizer
    }

    /// Normalizes `listing`, fingerprints it from metadata and reconciles it.
    pub fn reconcile_listing(
        &self,
        listing: &[RawFileDescriptor],
        history: &History,
    ) -> Reconciliation {
        let (candidates, skipped) = self.normalizer.normalize_all(listing);
        let observed = candidates
            .into_iter()
            .map(ObservedFile::with_metadata_fingerprint)
            .collect();

        let mut reconciliation = self.reconcile(observed, history);
        reconciliation.skipped = skipped;
        reconciliation
    }

    /// Classifies already fingerprinted files. Reads no clock and never fails.
    pub fn reconcile(&self, observed: Vec<ObservedFile>, history: &History) -> Reconciliation {
        let mut reconciliation = Reconciliation {
            inventory: Vec::with_capacity(observed.len()),
            ..Default::default()
        };
        let mut seen = HashSet::with_capacity(observed.len());

        for file in observed {
            if !seen.insert(file.candidate.name.clone()) {
                warn!(
                    "File name {} appears more than once in the listing; history keeps the last one",
                    file.candidate.name
                );
            }

            let (state, change) = classify(&file, history);
            let candidate = file.candidate;
            let record = FileRecord {
                fingerprint: file.fingerprint.value().to_string(),
                name: candidate.name,
                path: candidate.path,
                file_type: candidate.file_type,
                link: candidate.link,
                created_at: candidate.created_at,
                modified_at: candidate.modified_at,
                size_kb: candidate.size_kb,
                category: candidate.category,
                state,
            };

            debug!("{} -> {}", record.name, record.state);

            reconciliation
                .new_history
                .insert(record.name.clone(), HistoryEntry::from(&record));
            if let Some(change) = change {
                reconciliation.changes.push(change);
            }
            reconciliation.inventory.push(record);
        }

        reconciliation
    }
}

fn classify(file: &ObservedFile, history: &History) -> (FileState, Option<ChangeRecord>) {
    let candidate = &file.candidate;

    let fingerprint = match &file.fingerprint {
        FingerprintOutcome::Digest(value) => value,
        FingerprintOutcome::Failed(reason) => {
            warn!("Fingerprint unavailable for {}: {}", candidate.name, reason);
            return (FileState::Error, None);
        }
    };

    match history.get(&candidate.name) {
        None => (
            FileState::New,
            Some(ChangeRecord::new_file(
                candidate.name.clone(),
                candidate.created_at,
            )),
        ),
        Some(previous) if previous.fingerprint != *fingerprint => (
            FileState::Modified,
            Some(ChangeRecord::modified(
                candidate.name.clone(),
                previous.modified_at,
                candidate.modified_at,
                previous.fingerprint.clone(),
                fingerprint.clone(),
            )),
        ),
        Some(_) => (FileState::Valid, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::fingerprint::metadata_fingerprint;
    use crate::detection::normalizer::CandidateFile;
    use crate::models::ChangeKind;
    use crate::repository::FileClassifier;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn reconciler() -> Reconciler {
        Reconciler::new(FileNormalizer::new(
            "https://contoso.sharepoint.com",
            FileClassifier::default(),
        ))
    }

    fn descriptor(name: &str, bytes: i64) -> RawFileDescriptor {
        RawFileDescriptor {
            name: name.to_string(),
            server_path: format!("/sites/Docs/Shared/{}", name),
            created_at: Some("2024-01-01T00:00:00Z".to_string()),
            modified_at: Some("2024-03-01T10:00:00Z".to_string()),
            length_bytes: Some(bytes),
        }
    }

    fn listing() -> Vec<RawFileDescriptor> {
        vec![
            descriptor("Report.pdf", 10_240),
            descriptor("Budget.xlsx", 20_480),
            descriptor("Minutes.docx", 4_096),
        ]
    }

    #[test]
    fn test_absent_file_is_new() {
        let result = reconciler().reconcile_listing(&listing()[..1], &History::new());

        assert_eq!(result.inventory[0].state, FileState::New);
        assert_eq!(result.changes.len(), 1);
        let change = &result.changes[0];
        assert_eq!(change.kind, ChangeKind::New);
        assert_eq!(change.previous_fingerprint, None);
        assert_eq!(
            change.created_at,
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_changed_fingerprint_is_modified() {
        let first = reconciler().reconcile_listing(&listing(), &History::new());

        let mut next = listing();
        next[1].length_bytes = Some(30_720);
        next[1].modified_at = Some("2024-03-02T11:00:00Z".to_string());
        let second = reconciler().reconcile_listing(&next, &first.new_history);

        assert_eq!(second.changes.len(), 1);
        let change = &second.changes[0];
        assert_eq!(change.kind, ChangeKind::Modified);
        assert_eq!(change.name, "Budget.xlsx");
        assert_eq!(
            change.previous_fingerprint.as_deref(),
            Some(first.inventory[1].fingerprint.as_str())
        );
        assert_eq!(
            change.new_fingerprint.as_deref(),
            Some(second.inventory[1].fingerprint.as_str())
        );
        assert_eq!(
            change.previous_modified_at,
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap())
        );
        assert_eq!(
            change.new_modified_at,
            Some(Utc.with_ymd_and_hms(2024, 3, 2, 11, 0, 0).unwrap())
        );
        assert_eq!(second.inventory[1].state, FileState::Modified);
    }

    #[test]
    fn test_identical_fingerprint_is_valid() {
        let first = reconciler().reconcile_listing(&listing(), &History::new());
        let second = reconciler().reconcile_listing(&listing(), &first.new_history);

        assert!(second.changes.is_empty());
        assert_eq!(second.count(FileState::Valid), 3);
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let history = reconciler()
            .reconcile_listing(&listing()[..2], &History::new())
            .new_history;

        let a = reconciler().reconcile_listing(&listing(), &history);
        let b = reconciler().reconcile_listing(&listing(), &history);

        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_string(&a.new_history).unwrap(),
            serde_json::to_string(&b.new_history).unwrap()
        );
    }

    #[test]
    fn test_vanished_names_leave_history() {
        let first = reconciler().reconcile_listing(&listing(), &History::new());
        let second = reconciler().reconcile_listing(&listing()[..1], &first.new_history);

        assert_eq!(second.new_history.len(), 1);
        assert!(second.new_history.contains_key("Report.pdf"));
        assert!(!second.new_history.contains_key("Budget.xlsx"));
        assert!(!second.new_history.contains_key("Minutes.docx"));
    }

    #[test]
    fn test_one_malformed_descriptor_is_isolated() {
        let mut input = listing();
        input.push(RawFileDescriptor {
            length_bytes: None,
            ..descriptor("Broken.pdf", 0)
        });

        let result = reconciler().reconcile_listing(&input, &History::new());

        assert_eq!(result.inventory.len(), input.len() - 1);
        assert_eq!(result.skipped, 1);
        assert_eq!(result.changes.len(), 3);
        assert!(!result.new_history.contains_key("Broken.pdf"));
    }

    #[test]
    fn test_failed_fingerprint_is_error_without_change() {
        let first = reconciler().reconcile_listing(&listing(), &History::new());
        let candidate: CandidateFile = reconciler().normalizer().normalize(&listing()[0]).unwrap();
        let observed = vec![ObservedFile::new(
            candidate,
            FingerprintOutcome::Failed("read timed out".to_string()),
        )];

        let result = reconciler().reconcile(observed, &first.new_history);

        assert_eq!(result.inventory[0].state, FileState::Error);
        assert_eq!(result.inventory[0].fingerprint, "ERROR");
        assert!(result.changes.is_empty());
        assert_eq!(result.new_history["Report.pdf"].state, FileState::Error);
    }

    #[test]
    fn test_output_follows_listing_order() {
        let mut reversed = listing();
        reversed.reverse();
        let result = reconciler().reconcile_listing(&reversed, &History::new());

        let names: Vec<&str> = result.inventory.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Minutes.docx", "Budget.xlsx", "Report.pdf"]);
        let change_names: Vec<&str> = result.changes.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(change_names, names);
    }

    #[test]
    fn test_three_cycle_scenario() {
        let reconciler = reconciler();

        let first = reconciler.reconcile_listing(&listing(), &History::new());
        assert_eq!(first.inventory.len(), 3);
        assert_eq!(first.count(FileState::New), 3);
        assert_eq!(first.new_history.len(), 3);
        assert_eq!(first.changes.len(), 3);
        assert!(first.changes.iter().all(|c| c.kind == ChangeKind::New));

        let second = reconciler.reconcile_listing(&listing(), &first.new_history);
        assert_eq!(second.count(FileState::Valid), 3);
        assert!(second.changes.is_empty());

        let mut third_listing = listing();
        third_listing[2].length_bytes = Some(8_192);
        let third = reconciler.reconcile_listing(&third_listing, &second.new_history);

        assert_eq!(third.count(FileState::Valid), 2);
        assert_eq!(third.count(FileState::Modified), 1);
        assert_eq!(third.changes.len(), 1);

        let change = &third.changes[0];
        let before = &second.inventory[2];
        let after = &third.inventory[2];
        assert_eq!(change.name, "Minutes.docx");
        assert_eq!(change.previous_fingerprint.as_deref(), Some(before.fingerprint.as_str()));
        assert_eq!(change.new_fingerprint.as_deref(), Some(after.fingerprint.as_str()));

        let expected = reconciler.normalizer().normalize(&third_listing[2]).unwrap();
        assert_eq!(after.fingerprint, metadata_fingerprint(&expected));
    }
}
