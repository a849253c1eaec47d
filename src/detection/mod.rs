// file: src/detection/mod.rs
// description: change detection engine exports
// reference: internal module structure

pub mod anomaly;
pub mod fingerprint;
pub mod normalizer;
pub mod reconciler;

pub use anomaly::{AnomalyDetector, NamePolicy};
pub use fingerprint::{FingerprintOutcome, ObservedFile};
pub use normalizer::{CandidateFile, FileNormalizer};
pub use reconciler::{Reconciler, Reconciliation};
