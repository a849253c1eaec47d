// file: src/lib.rs
// description: library entry point and public api exports
// reference: rust library patterns
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/readme.md"))]

pub mod api;
pub mod config;
pub mod detection;
pub mod error;
pub mod exporter;
pub mod models;
pub mod pipeline;
pub mod repository;
pub mod store;
pub mod utils;

pub use config::{
    AnomalyConfig, ApiConfig, Config, FingerprintConfig, FingerprintMode, ObjectStoreConfig,
    SchedulerConfig, SourceConfig, SourceKind, StorageConfig,
};
pub use detection::{AnomalyDetector, Reconciler, Reconciliation};
pub use error::{MonitorError, Result};
pub use exporter::{ExportManifest, InventoryRow, InventorySink, JsonExporter, ObjectStoreUploader};
pub use models::{AnomalyReport, ChangeKind, ChangeRecord, FileRecord, FileState, History};
pub use pipeline::{CycleReport, CycleRunner, CycleScheduler, CycleStats, SchedulerHandle};
pub use repository::{FileClassifier, FileSource, LocalFolderSource, SharePointSource};
pub use store::{ChangeLogStore, CycleLogStore, CycleRecord, HistoryStore};
pub use utils::{HealthCheck, HealthReport, HealthStatus, OperationTimer, Validator};
