// file: src/models/mod.rs
// description: data models module exports
// reference: internal module structure

pub mod anomaly;
pub mod change;
pub mod file_record;
pub mod history;
pub mod timestamp;

pub use anomaly::{
    AnomalyReport, AnomalySummary, DuplicateContentGroup, DuplicateNameGroup, FileVersion,
    IdenticalFile,
};
pub use change::{ChangeKind, ChangeLogEntry, ChangeRecord};
pub use file_record::{ERROR_FINGERPRINT, FileRecord, FileState, RawFileDescriptor};
pub use history::{History, HistoryEntry};
